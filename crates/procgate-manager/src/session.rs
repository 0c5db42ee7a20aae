//! Session gateway: per-request connection acquisition and guaranteed
//! release.

use crate::client::{ManagerClient, ManagerSession};
use futures::future::FutureExt;
use procgate_common::{Error, Result};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

/// Opens a manager connection, runs `action` with the live session, and
/// releases the connection on every exit path.
///
/// Connect failure short-circuits before `action` runs. A panic inside
/// `action` is contained and converted to a transport error after the
/// connection has been released. Disconnect failures are logged and never
/// override the primary result.
pub async fn with_manager_session<T, F, Fut>(client: &dyn ManagerClient, action: F) -> Result<T>
where
    F: FnOnce(Arc<dyn ManagerSession>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = client.connect().await?;

    let outcome = AssertUnwindSafe(action(Arc::clone(&session)))
        .catch_unwind()
        .await;

    if let Err(e) = session.disconnect().await {
        warn!("Failed to release manager connection: {}", e);
    }

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(Error::transport(format!(
            "Manager action panicked: {}",
            panic_message(payload)
        ))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
