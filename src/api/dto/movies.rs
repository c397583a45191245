/*
 * Responsibility
 * - Movies の request/response DTO
 * - release_date は ISO (2019-04-22) と US 形式 (04-22-2019) を受け付け、ISO で返す
 */
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::repos::movie_repo::MovieRow;

const RELEASE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m-%d-%Y"];

fn parse_release_date(value: &str) -> Option<NaiveDate> {
    RELEASE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: NaiveDate,
}

impl CreateMovieRequest {
    pub fn validate(self) -> Result<NewMovie, &'static str> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err("title is required"),
        };
        let release_date = self
            .release_date
            .as_deref()
            .ok_or("release_date is required")
            .and_then(|v| parse_release_date(v).ok_or("release_date is not a date"))?;

        Ok(NewMovie {
            title,
            release_date,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl UpdateMovieRequest {
    pub fn validate(self) -> Result<MovieChanges, &'static str> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        let release_date = match self.release_date.as_deref() {
            Some(v) => Some(parse_release_date(v).ok_or("release_date is not a date")?),
            None => None,
        };

        Ok(MovieChanges {
            title: self.title,
            release_date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub release_date: NaiveDate,
}

impl From<MovieRow> for MovieResponse {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            release_date: row.release_date,
        }
    }
}

/// GET /movies
#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub success: bool,
    pub movies: Vec<MovieResponse>,
}

/// POST / PATCH /movies
#[derive(Debug, Serialize)]
pub struct MovieEnvelope {
    pub success: bool,
    pub movie: Vec<MovieResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: Option<&str>, release_date: Option<&str>) -> CreateMovieRequest {
        CreateMovieRequest {
            title: title.map(str::to_string),
            release_date: release_date.map(str::to_string),
        }
    }

    #[test]
    fn accepts_iso_and_us_dates() {
        let expected = NaiveDate::from_ymd_opt(2019, 4, 22).unwrap();
        let iso = create(Some("Avengers: End game"), Some("2019-04-22"))
            .validate()
            .unwrap();
        let us = create(Some("Avengers: End game"), Some("04-22-2019"))
            .validate()
            .unwrap();

        assert_eq!(iso.release_date, expected);
        assert_eq!(us, iso);
    }

    #[test]
    fn create_requires_both_fields() {
        assert_eq!(
            create(None, Some("2019-04-22")).validate(),
            Err("title is required")
        );
        assert_eq!(
            create(Some("  "), Some("2019-04-22")).validate(),
            Err("title is required")
        );
        assert_eq!(
            create(Some("Heat"), None).validate(),
            Err("release_date is required")
        );
        assert_eq!(
            create(Some("Heat"), Some("someday")).validate(),
            Err("release_date is not a date")
        );
    }

    #[test]
    fn update_allows_partial_bodies() {
        let changes = UpdateMovieRequest {
            title: None,
            release_date: Some("1995-12-15".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.release_date, NaiveDate::from_ymd_opt(1995, 12, 15));

        let empty = UpdateMovieRequest {
            title: None,
            release_date: None,
        }
        .validate()
        .unwrap();
        assert_eq!(empty, MovieChanges::default());
    }

    #[test]
    fn update_rejects_blank_title() {
        let req = UpdateMovieRequest {
            title: Some(String::new()),
            release_date: None,
        };
        assert_eq!(req.validate(), Err("title cannot be empty"));
    }

    #[test]
    fn response_serializes_iso_date() {
        let res = MovieResponse::from(MovieRow {
            id: 7,
            title: "Heat".into(),
            release_date: NaiveDate::from_ymd_opt(1995, 12, 15).unwrap(),
        });
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["release_date"], "1995-12-15");
        assert_eq!(json["id"], 7);
    }
}
