use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_uuid;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::model::{CreateUserDto, UserFilterParams, UserRole};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTeacherDto {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone: Option<String>,
    pub school_id: Option<Uuid>,
}

impl From<CreateTeacherDto> for CreateUserDto {
    fn from(dto: CreateTeacherDto) -> Self {
        CreateUserDto {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            password: dto.password,
            role: UserRole::Teacher,
            school_id: dto.school_id,
            phone: dto.phone,
            class_id: None,
            section_id: None,
            roll_number: None,
            parent_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherFilterParams {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl From<TeacherFilterParams> for UserFilterParams {
    fn from(f: TeacherFilterParams) -> Self {
        UserFilterParams {
            role: Some(UserRole::Teacher),
            class_id: None,
            section_id: None,
            search: f.search,
            school_id: f.school_id,
            pagination: f.pagination,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignSubjectsDto {
    #[validate(length(min = 1, message = "At least one subject is required"))]
    pub subject_ids: Vec<Uuid>,
}
