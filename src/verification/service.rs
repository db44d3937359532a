use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::state::AppState;
use crate::store::{now_iso, parse_iso, to_iso, Store, StoreError, UserRecord};

pub const TOKEN_TTL_HOURS: i64 = 24;

// 43 alphanumeric chars carry slightly over 256 bits, on par with a
// 32-byte url-safe token.
fn urlsafe_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(43)
        .map(char::from)
        .collect()
}

/// Stamps a fresh token on the user and marks the email unverified until it
/// is consumed.
pub async fn issue_token(store: &Store, user_id: u32) -> Result<String, StoreError> {
    let token = urlsafe_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::hours(TOKEN_TTL_HOURS);
    let stamped = token.clone();
    store
        .with_user_mut(user_id, move |user| {
            user.verification_token = Some(stamped);
            user.verification_sent_at = Some(now_iso());
            user.verification_expires_at = Some(to_iso(expires_at));
            user.email_verified = false;
            Ok(())
        })
        .await?;
    info!(user_id, "verification token issued");
    Ok(token)
}

#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    Success { email: String },
    Expired,
    Invalid,
}

/// Single use: success marks the email verified and clears all token state.
/// Expired tokens stay stored so the failure is observable afterwards.
pub async fn consume_token(store: &Store, token: &str) -> Result<VerifyOutcome, StoreError> {
    let Some(user) = store.user_by_verification_token(token).await? else {
        return Ok(VerifyOutcome::Invalid);
    };

    if let Some(expires_at) = user
        .verification_expires_at
        .as_deref()
        .and_then(parse_iso)
    {
        if OffsetDateTime::now_utc() > expires_at {
            return Ok(VerifyOutcome::Expired);
        }
    }

    store
        .with_user_mut(user.id, |u| {
            u.email_verified = true;
            u.verification_token = None;
            u.verification_sent_at = None;
            u.verification_expires_at = None;
            Ok(())
        })
        .await?;
    info!(user_id = user.id, "email verified");
    Ok(VerifyOutcome::Success { email: user.email })
}

/// Issues a token and hands the composed message to the mailer. Callers
/// treat a delivery failure as advisory, never as an operation failure.
pub async fn send_verification_email(state: &AppState, user: &UserRecord) -> anyhow::Result<()> {
    let token = issue_token(&state.store, user.id).await?;
    let verify_url = format!(
        "{}/verify-email/{}",
        state.config.public_base_url.trim_end_matches('/'),
        token
    );
    let greeting = if user.full_name.is_empty() {
        user.username.as_str()
    } else {
        user.full_name.as_str()
    };
    let body = format!(
        "Hi {greeting},\n\n\
         Please verify your email address by clicking the link below:\n\
         {verify_url}\n\n\
         This link expires in 24 hours."
    );
    state
        .mailer
        .send(&user.email, "Verify your email", &body)
        .await
}
