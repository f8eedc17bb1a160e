use colcheck_core::TableHost;

use crate::wizard::{Chrome, Wizard};

/// Tear down after the last column: drop the lingering row filter, give the
/// wizard its chrome back and hand control to its completion callback.
///
/// A failure to remove the filter is logged and otherwise ignored.
pub fn finalize(host: &mut dyn TableHost, wizard: &mut dyn Wizard, lingering_filter: Option<&str>) {
    if let Some(column) = lingering_filter {
        if let Err(e) = host.remove_row_filter(column) {
            log::warn!("could not remove row filter on '{}': {}", column, e);
        }
    }
    wizard.set_chrome(Chrome::Default);
    log::info!("verification finished for wizard '{}'", wizard.name());
    wizard.complete();
}
