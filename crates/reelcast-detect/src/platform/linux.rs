use mpris::PlayerFinder;
use tracing::debug;

use crate::source_db::SourceDatabase;
use crate::{DetectError, RawTitle};

/// Collect titles from MPRIS players over D-Bus.
///
/// Browsers publish the playing tab's title here, and Firefox also publishes
/// the page URL. A player whose metadata can't be read is skipped.
pub fn collect_mpris(db: &SourceDatabase) -> Result<Vec<RawTitle>, DetectError> {
    let finder = PlayerFinder::new().map_err(|e| DetectError::Dbus(e.to_string()))?;

    let players = match finder.find_all() {
        Ok(p) => p,
        Err(e) => {
            debug!("No MPRIS players found: {e}");
            return Ok(vec![]);
        }
    };

    Ok(players
        .into_iter()
        .filter_map(|player| {
            let identity = player.identity().to_string();
            let metadata = match player.get_metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!(player = %identity, error = %e, "Skipping MPRIS player");
                    return None;
                }
            };

            let text = metadata.title()?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            let url = metadata
                .url()
                .filter(|u| u.starts_with("http"))
                .map(str::to_string);

            debug!(player = %identity, title = %text, "Sampled MPRIS title");

            Some(RawTitle {
                text,
                source: db.source_for_mpris(&identity),
                url,
            })
        })
        .collect())
}
