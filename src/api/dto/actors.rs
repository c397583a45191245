/*
 * Responsibility
 * - Actors の request/response DTO
 */
use serde::{Deserialize, Serialize};

use crate::repos::actor_repo::ActorRow;

const MAX_AGE: i32 = 150;

fn check_age(age: i32) -> Result<i32, &'static str> {
    if (0..=MAX_AGE).contains(&age) {
        Ok(age)
    } else {
        Err("age is out of range")
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateActorRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewActor {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl CreateActorRequest {
    pub fn validate(self) -> Result<NewActor, &'static str> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err("name is required"),
        };
        let age = check_age(self.age.ok_or("age is required")?)?;
        let gender = match self.gender {
            Some(gender) if !gender.trim().is_empty() => gender,
            _ => return Err("gender is required"),
        };

        Ok(NewActor { name, age, gender })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateActorRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ActorChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl UpdateActorRequest {
    pub fn validate(self) -> Result<ActorChanges, &'static str> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("name cannot be empty");
        }
        let age = self.age.map(check_age).transpose()?;
        if let Some(gender) = &self.gender
            && gender.trim().is_empty()
        {
            return Err("gender cannot be empty");
        }

        Ok(ActorChanges {
            name: self.name,
            age,
            gender: self.gender,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ActorResponse {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl From<ActorRow> for ActorResponse {
    fn from(row: ActorRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
        }
    }
}

/// GET /actors
#[derive(Debug, Serialize)]
pub struct ActorsResponse {
    pub success: bool,
    pub actors: Vec<ActorResponse>,
}

/// POST / PATCH /actors
#[derive(Debug, Serialize)]
pub struct ActorEnvelope {
    pub success: bool,
    pub actor: Vec<ActorResponse>,
}
