//! Liveness and readiness probe handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Both are registered by [`api::router`](crate::api::router).

use std::sync::Arc;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::response::{Json, Response};
use crate::request::Request;

/// Always returns `200 OK` with body `"ok"`. If the process can respond to
/// HTTP at all, it is alive.
pub async fn liveness(_req: Request, _data: Arc<Dataset>) -> Response {
    Response::text("ok")
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub users: usize,
    pub activities: usize,
}

/// The dataset is loaded before the listener opens, so a server that answers
/// is ready. Reports the collection sizes it is serving.
pub async fn readiness(_req: Request, data: Arc<Dataset>) -> Json<Readiness> {
    Json(Readiness {
        ready: true,
        users: data.users().len(),
        activities: data.activities().len(),
    })
}
