//! Joins snapshot quotes with display names.

use futures::future::join_all;

use coinfeed_common::{
    format_display, EnrichedCurrency, EnrichedResponse, PriceSnapshot, UpdateTimes,
};

use crate::error::{FeedError, FeedResult};
use crate::resolver::NameLookup;

/// Build the enriched response for `snapshot`.
///
/// Entries come out ordered by currency code. Name resolution never fails, so
/// the only error is a missing snapshot.
pub async fn assemble(
    snapshot: Option<&PriceSnapshot>,
    names: &dyn NameLookup,
    locale: &str,
) -> FeedResult<EnrichedResponse> {
    let snapshot = snapshot.ok_or(FeedError::MissingSnapshot)?;

    let resolved = join_all(
        snapshot
            .entries
            .keys()
            .map(|code| names.resolve(code, locale)),
    )
    .await;

    let mut currency_infos: Vec<EnrichedCurrency> = snapshot
        .entries
        .iter()
        .zip(resolved)
        .map(|((code, quote), name)| EnrichedCurrency {
            currency_code: code.clone(),
            currency_name: name,
            currency_rate: quote.rate_display.clone(),
        })
        .collect();
    currency_infos.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));

    let times = &snapshot.times;
    Ok(EnrichedResponse {
        update_times: UpdateTimes {
            update_time: format_display(times.updated_at_utc),
            update_time_iso: format_display(times.updated_at_iso),
            update_time_uk: format_display(times.updated_at_uk),
        },
        currency_infos,
    })
}
