//! Watch command handler
//!
//! Follows datasets, models and inference files at once; each collection
//! has its own poller and settles independently.

use anyhow::Result;

use super::{Follow, Session, dataset, inference, model};

/// Follow every collection until all of them settle
pub async fn watch_all(session: &Session) -> Result<()> {
    let (datasets, models, inferences) = tokio::join!(
        dataset::follow(session, Follow::UntilSettled),
        model::follow(session, Follow::UntilSettled),
        inference::follow(session, Follow::UntilSettled),
    );

    datasets?;
    models?;
    inferences
}
