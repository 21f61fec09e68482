use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_uuid;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::model::{CreateUserDto, UserFilterParams, UserRole};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone: Option<String>,
    pub class_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
    #[validate(length(max = 50, message = "Roll number is at most 50 characters"))]
    pub roll_number: Option<String>,
    pub parent_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
}

impl From<CreateStudentDto> for CreateUserDto {
    fn from(dto: CreateStudentDto) -> Self {
        CreateUserDto {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            password: dto.password,
            role: UserRole::Student,
            school_id: dto.school_id,
            phone: dto.phone,
            class_id: dto.class_id,
            section_id: dto.section_id,
            roll_number: dto.roll_number,
            parent_id: dto.parent_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub section_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl From<StudentFilterParams> for UserFilterParams {
    fn from(f: StudentFilterParams) -> Self {
        UserFilterParams {
            role: Some(UserRole::Student),
            class_id: f.class_id,
            section_id: f.section_id,
            search: f.search,
            school_id: f.school_id,
            pagination: f.pagination,
        }
    }
}
