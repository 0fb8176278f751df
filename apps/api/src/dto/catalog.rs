use kasira_application::CreatedEmployee;
use kasira_domain::{Employee, Product};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for employee provisioning.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-employee-request.ts"
)]
pub struct CreateEmployeeRequest {
    pub display_name: String,
    pub email: String,
    pub primary_role: String,
    #[serde(default)]
    pub additional_roles: Vec<String>,
}

/// Incoming payload for role reassignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-roles-request.ts"
)]
pub struct AssignRolesRequest {
    pub primary_role: String,
    #[serde(default)]
    pub additional_roles: Vec<String>,
}

/// API representation of an employee.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/employee-response.ts"
)]
pub struct EmployeeResponse {
    pub employee_id: i64,
    pub display_name: String,
    pub email: String,
    pub account_status: String,
}

impl From<&Employee> for EmployeeResponse {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id().as_i64(),
            display_name: employee.display_name().to_owned(),
            email: employee.email().as_str().to_owned(),
            account_status: employee.account_status().as_str().to_owned(),
        }
    }
}

/// Newly provisioned employee with its one-shot password.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/created-employee-response.ts"
)]
pub struct CreatedEmployeeResponse {
    pub employee: EmployeeResponse,
    pub temporary_password: String,
}

impl From<CreatedEmployee> for CreatedEmployeeResponse {
    fn from(created: CreatedEmployee) -> Self {
        Self {
            employee: EmployeeResponse::from(&created.employee),
            temporary_password: created.temporary_password,
        }
    }
}

/// Incoming payload for product creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-product-request.ts"
)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub price: i64,
}

/// Incoming payload for product detail edits. Prices change through approvals.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-product-request.ts"
)]
pub struct UpdateProductRequest {
    pub name: String,
    pub sku: String,
}

/// API representation of a product.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/product-response.ts"
)]
pub struct ProductResponse {
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub price: i64,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id().as_i64(),
            name: product.name().to_owned(),
            sku: product.sku().to_owned(),
            price: product.price().amount(),
        }
    }
}
