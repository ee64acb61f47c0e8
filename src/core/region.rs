//! Region record lifecycle.
//!
//! Every mutation loads the region, changes it in memory, and writes the
//! whole region table back. Status changes and history notes are separate
//! operations: changing the status never appends to the timeline.

use crate::{
    core::{
        authz::{Action, require},
        store::Store,
    },
    errors::{Error, Result},
    models::{Actor, ChangeStamp, Contact, DocumentItem, HistoryEntry, Region, RegistrationStatus},
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// Loads a region, applies `edit`, and stores the result.
async fn edit_region<F>(store: &Store, actor: &Actor, code: &str, edit: F) -> Result<Region>
where
    F: FnOnce(&mut Region, DateTime<Utc>) -> Result<()>,
{
    require(actor, Action::EditRegion)?;
    let mut region = store.get_region(code).await?;
    edit(&mut region, Utc::now())?;
    store.put_region(&region).await?;
    Ok(region)
}

/// All regions, for any role that may view them.
pub async fn list_regions(store: &Store, actor: &Actor) -> Result<Vec<Region>> {
    require(actor, Action::ViewRegions)?;
    store.list_regions().await
}

/// Regions whose name or code contains `term`, ignoring case.
pub async fn search_regions(store: &Store, actor: &Actor, term: &str) -> Result<Vec<Region>> {
    Ok(list_regions(store, actor)
        .await?
        .into_iter()
        .filter(|r| r.matches_search(term))
        .collect())
}

/// One region by code.
pub async fn get_region(store: &Store, actor: &Actor, code: &str) -> Result<Region> {
    require(actor, Action::ViewRegions)?;
    store.get_region(code).await
}

/// Overwrites the current status. Any state may follow any other, and the
/// timeline is left untouched.
pub async fn set_status(
    store: &Store,
    actor: &Actor,
    code: &str,
    status: RegistrationStatus,
) -> Result<Region> {
    let region = edit_region(store, actor, code, |region, _| {
        region.current_status = status;
        Ok(())
    })
    .await?;
    info!("{} set {} to {}", actor.username, region.code, status);
    Ok(region)
}

/// Records a timeline note against the region's current status.
///
/// Editors call this after each contact with a registry office. The entry
/// is stamped with the actor's name and inserted at the front of the
/// timeline, newest first. Blank notes are ignored and nothing is written.
pub async fn append_history_note(
    store: &Store,
    actor: &Actor,
    code: &str,
    notes: &str,
) -> Result<Region> {
    require(actor, Action::EditRegion)?;
    if notes.trim().is_empty() {
        debug!("Ignoring blank history note for {}", code);
        return store.get_region(code).await;
    }

    edit_region(store, actor, code, |region, now| {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            date: now,
            status: region.current_status,
            notes: notes.to_string(),
            user: Some(actor.display_name()),
        };
        region.status_history.insert(0, entry);
        Ok(())
    })
    .await
}

/// Appends a pending checklist item.
pub async fn add_document(
    store: &Store,
    actor: &Actor,
    code: &str,
    description: &str,
) -> Result<Region> {
    if description.trim().is_empty() {
        return Err(Error::validation("Document description is required."));
    }

    edit_region(store, actor, code, |region, now| {
        region
            .documents
            .push(DocumentItem::pending(description.to_string(), now));
        Ok(())
    })
    .await
}

/// Flips a checklist item's compliance flag and refreshes its timestamp.
pub async fn toggle_document_compliance(
    store: &Store,
    actor: &Actor,
    code: &str,
    document_id: &str,
) -> Result<Region> {
    edit_region(store, actor, code, |region, now| {
        let doc = region
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| Error::not_found("Document", document_id))?;
        doc.is_compliant = !doc.is_compliant;
        doc.last_updated = now;
        Ok(())
    })
    .await
}

/// Deletes a checklist item. The timeline is not affected.
pub async fn remove_document(
    store: &Store,
    actor: &Actor,
    code: &str,
    document_id: &str,
) -> Result<Region> {
    edit_region(store, actor, code, |region, _| {
        let before = region.documents.len();
        region.documents.retain(|d| d.id != document_id);
        if region.documents.len() == before {
            return Err(Error::not_found("Document", document_id));
        }
        Ok(())
    })
    .await
}

/// Replaces the deadline and alert window and stamps the change.
pub async fn update_config(
    store: &Store,
    actor: &Actor,
    code: &str,
    expiration_date: Option<DateTime<Utc>>,
    alert_days: i64,
) -> Result<Region> {
    edit_region(store, actor, code, |region, now| {
        region.expiration_date = expiration_date;
        region.alert_days = alert_days;
        region.config_metadata = Some(ChangeStamp {
            last_updated: now,
            user: actor.display_name(),
        });
        Ok(())
    })
    .await
}

/// Replaces the contact and stamps the change.
pub async fn update_contact(
    store: &Store,
    actor: &Actor,
    code: &str,
    contact: Contact,
) -> Result<Region> {
    edit_region(store, actor, code, |region, now| {
        region.contact = contact;
        region.contact_metadata = Some(ChangeStamp {
            last_updated: now,
            user: actor.display_name(),
        });
        Ok(())
    })
    .await
}

/// Formats a phone number from its digits: `(11) 91234-5678` for mobiles,
/// `(11) 1234-5678` for landlines, and partial forms while typing. Digits
/// beyond eleven are dropped.
#[must_use]
pub fn format_phone(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).take(11).collect();
    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({digits}"),
        3..=5 => format!("({}) {}", &digits[..2], &digits[2..]),
        6..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}
