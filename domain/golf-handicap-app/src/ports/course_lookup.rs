use std::collections::HashMap;

use golf_core::Tee;
use serde::{Deserialize, Serialize};

use crate::domain::CourseId;

/// Eighteen hole course and slope ratings per tee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub rating: HashMap<Tee, f64>,
    pub slope: HashMap<Tee, f64>,
}

#[async_trait::async_trait]
pub trait CourseLookupPort {
    async fn get_course(&self, course_id: CourseId) -> Result<Course, CourseLookupError>;
}

#[derive(Debug, Clone)]
pub enum CourseLookupError {
    NotFound,
    Unavailable(String),
}
