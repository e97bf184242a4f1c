//! Author model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Author record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub author_reference: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub awards: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Author {
    pub fn new(data: CreateAuthor) -> Self {
        let now = Utc::now();
        Self {
            author_reference: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            date_of_birth: data.date_of_birth,
            nationality: data.nationality,
            biography: data.biography,
            email: data.email,
            phone: data.phone,
            awards: data.awards.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    pub fn apply(&mut self, data: UpdateAuthor) {
        if let Some(first_name) = data.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            self.last_name = last_name;
        }
        if data.date_of_birth.is_some() {
            self.date_of_birth = data.date_of_birth;
        }
        if data.nationality.is_some() {
            self.nationality = data.nationality;
        }
        if let Some(biography) = data.biography {
            self.biography = biography;
        }
        if data.email.is_some() {
            self.email = data.email;
        }
        if data.phone.is_some() {
            self.phone = data.phone;
        }
        if let Some(awards) = data.awards {
            self.awards = awards;
        }
        self.updated_at = Utc::now();
    }
}

/// Create author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    #[validate(length(min = 1, message = "Biography is required"))]
    pub biography: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub awards: Option<Vec<String>>,
}

/// Update author request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    #[validate(length(min = 1))]
    pub biography: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub awards: Option<Vec<String>>,
}
