//! Find-or-create for helpdesk requesters.
//!
//! Tickets must reference an existing requester. [`ensure_requester`] looks
//! the requester up by e-mail and creates one when the lookup comes back
//! empty. Nothing is cached, and two concurrent calls for a new e-mail can
//! both end up creating a requester.

use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::models::{ApiResponse, NewRequester, RequesterResponse};
use crate::sdp_client::SdpClient;

/// Contact details of the person a ticket is raised for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequesterContact {
    /// Full name; may be empty.
    pub name: String,
    /// E-mail address, the lookup key.
    pub email: String,
    /// Phone number; may be empty.
    pub phone: String,
    /// Company name; may be empty.
    pub company: String,
}

/// Outcome of [`ensure_requester`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnsuredRequester {
    /// Requester id, when one was found or created.
    pub id: Option<String>,
    /// True when the requester already existed.
    pub existing: bool,
    /// Status and body of both calls, set when no id could be obtained.
    pub diagnostic: Option<Value>,
}

/// Splits a full name into first and last name.
///
/// The first whitespace-separated token is the first name; the remaining
/// tokens, joined by single spaces, form the last name.
pub fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Builds the creation payload for a contact.
///
/// Without a name the e-mail stands in for both the display name and the
/// first name.
pub fn new_requester(contact: &RequesterContact) -> NewRequester {
    let (first_name, last_name) = split_name(&contact.name);
    let first_name = if first_name.is_empty() {
        contact.email.clone()
    } else {
        first_name
    };
    let name = if contact.name.trim().is_empty() {
        contact.email.clone()
    } else {
        contact.name.trim().to_string()
    };

    NewRequester {
        first_name,
        last_name,
        name,
        email_id: contact.email.clone(),
        phone: Some(contact.phone.trim().to_string()).filter(|p| !p.is_empty()),
        description: Some(contact.company.trim())
            .filter(|c| !c.is_empty())
            .map(|c| format!("Company: {}", c)),
    }
}

/// Returns the id of the requester with `contact.email`, creating it if needed.
///
/// # Errors
///
/// Only transport failures are errors. A lookup or create that answers with
/// a non-2xx status (or without an id) ends up in
/// [`EnsuredRequester::diagnostic`].
pub async fn ensure_requester(
    client: &SdpClient,
    token: &str,
    contact: &RequesterContact,
) -> Result<EnsuredRequester, GatewayError> {
    let found = client.find_requester_by_email(token, &contact.email).await?;

    if found.is_success() {
        if let Some(id) = found
            .parse::<RequesterResponse>()
            .and_then(|r| r.first_listed_id())
        {
            tracing::debug!(requester_id = %id, "Requester already exists");
            return Ok(EnsuredRequester {
                id: Some(id),
                existing: true,
                diagnostic: None,
            });
        }
    }

    let created = client
        .create_requester(token, &new_requester(contact))
        .await?;

    if created.is_success() {
        if let Some(id) = created
            .parse::<RequesterResponse>()
            .and_then(|r| r.created_id())
        {
            tracing::info!(requester_id = %id, "Requester created");
            return Ok(EnsuredRequester {
                id: Some(id),
                existing: false,
                diagnostic: None,
            });
        }
    }

    tracing::warn!(
        find_status = %found.status,
        create_status = %created.status,
        "Could not find or create requester"
    );

    Ok(EnsuredRequester {
        id: None,
        existing: false,
        diagnostic: Some(json!({
            "find": describe(&found),
            "create": describe(&created),
        })),
    })
}

fn describe(response: &ApiResponse) -> Value {
    json!({
        "status": response.status.as_u16(),
        "data": response.body,
    })
}
