use tracing::debug;

use crate::browser::{BrowserSession, SelectOutcome};
use crate::error::CrawlError;

/// Select `value` in the live facet control `control_id`.
pub fn select_facet<S>(session: &mut S, control_id: &str, value: &str) -> Result<(), CrawlError>
where
    S: BrowserSession + ?Sized,
{
    let outcome = session
        .select_option_by_value(control_id, value)
        .map_err(CrawlError::Session)?;

    match outcome {
        SelectOutcome::Selected => {
            debug!("Selected '{}' in #{}", value, control_id);
            Ok(())
        }
        SelectOutcome::ControlMissing => Err(CrawlError::ControlNotFound {
            control: control_id.to_string(),
        }),
        SelectOutcome::ValueRejected => Err(CrawlError::ValueNotSelectable {
            control: control_id.to_string(),
            value: value.to_string(),
        }),
    }
}
