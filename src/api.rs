//! The OhMyBank read API.
//!
//! | Method | Path | Body |
//! |---|---|---|
//! | GET | `/` | service status |
//! | GET | `/api/v2/users` | every user, in source order |
//! | GET | `/api/v2/users/{user_id}/activities` | that user's activities, in source order |
//! | GET | `/healthz`, `/readyz` | probes, see [`health`](crate::health) |

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::dataset::Dataset;
use crate::health;
use crate::method::Method;
use crate::request::Request;
use crate::response::Json;
use crate::router::Router;

/// Builds the application router over a loaded dataset.
pub fn router(dataset: Dataset) -> Router<Dataset> {
    Router::new(dataset)
        .on(Method::Get, "/",                                  root)
        .on(Method::Get, "/api/v2/users",                      list_users)
        .on(Method::Get, "/api/v2/users/{user_id}/activities", list_user_activities)
        .on(Method::Get, "/healthz",                           health::liveness)
        .on(Method::Get, "/readyz",                            health::readiness)
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub message: &'static str,
}

// GET /
async fn root(_req: Request, _data: Arc<Dataset>) -> Json<ServiceStatus> {
    Json(ServiceStatus { status: "success", message: "OhMyBank API is running" })
}

// GET /api/v2/users
async fn list_users(_req: Request, data: Arc<Dataset>) -> Json<Users> {
    Json(Users(data))
}

// GET /api/v2/users/{user_id}/activities
//
// An unknown user and a user with no activities are indistinguishable: both
// get `[]` with 200.
async fn list_user_activities(req: Request, data: Arc<Dataset>) -> Json<UserActivities> {
    let user_id = req.param("user_id").unwrap_or_default().to_owned();
    Json(UserActivities { data, user_id })
}

/// The user collection, serialized straight from the shared dataset.
pub struct Users(Arc<Dataset>);

impl Serialize for Users {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(self.0.users())
    }
}

/// One user's activities, filtered while serializing.
pub struct UserActivities {
    data: Arc<Dataset>,
    user_id: String,
}

impl Serialize for UserActivities {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(self.data.activities_for(&self.user_id))
    }
}
