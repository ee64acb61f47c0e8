//! Session handling: login, first-login password change, logout, and the
//! recurring liveness check that ends a session whose account was
//! deactivated or deleted.

use crate::{
    core::{
        store::Store,
        user::{change_password, validate_login},
    },
    errors::{Error, Result},
    models::{Actor, SessionUser, normalize_email},
};
use std::time::Duration;
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

/// Result of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Session stored; full access granted
    Authenticated(SessionUser),
    /// Credentials were right but the default password must be replaced
    /// first. No session is stored.
    PasswordChangeRequired(SessionUser),
}

/// Logs in with email and password.
pub async fn login(store: &Store, email: &str, password: &str) -> Result<LoginOutcome> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::validation("Enter email and password."));
    }

    let user = validate_login(store, email, password).await?;
    if user.is_first_login {
        info!("{} must change the default password", user.email);
        return Ok(LoginOutcome::PasswordChangeRequired(user));
    }

    store.save_session(&user).await?;
    info!("{} logged in", user.email);
    Ok(LoginOutcome::Authenticated(user))
}

/// Password rule: only ASCII letters, digits, `@` and `*`, with at least one
/// letter, one digit, and one of `@`/`*`.
pub fn validate_password_strength(password: &str) -> Result<()> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '@' || c == '*');
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.contains(['@', '*']);

    if allowed && has_letter && has_digit && has_special {
        Ok(())
    } else {
        Err(Error::validation(
            "Password must contain letters, numbers, and the special character @ or *.",
        ))
    }
}

/// Replaces the default password after a [`LoginOutcome::PasswordChangeRequired`]
/// and opens the session.
pub async fn complete_first_login(
    store: &Store,
    email: &str,
    current_password: &str,
    new_password: &str,
    confirmation: &str,
) -> Result<SessionUser> {
    let user = validate_login(store, email, current_password).await?;
    if !user.is_first_login {
        return Err(Error::validation("No password change is pending."));
    }
    if new_password != confirmation {
        return Err(Error::validation("Passwords do not match."));
    }
    validate_password_strength(new_password)?;

    change_password(store, &user.email, new_password).await?;

    match login(store, &user.email, new_password).await? {
        LoginOutcome::Authenticated(session) => Ok(session),
        LoginOutcome::PasswordChangeRequired(_) => {
            Err(Error::validation("Password change did not take effect."))
        }
    }
}

/// Ends the current session.
pub async fn logout(store: &Store) -> Result<()> {
    store.clear_session().await?;
    info!("Session closed");
    Ok(())
}

/// Acting-user context of the open session, if any.
pub async fn current_actor(store: &Store) -> Result<Option<Actor>> {
    Ok(store.load_session().await?.map(|s| s.actor()))
}

/// State of the stored session against the user table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    /// Nobody is logged in
    NoSession,
    /// The session's account still exists and is active
    Alive(SessionUser),
    /// The account was deactivated or deleted; the session has been cleared
    Revoked {
        /// Email of the revoked session
        email: String,
    },
}

/// Re-reads the user table and clears the session if its account is gone or inactive.
///
/// An administrator may deactivate or delete an account while its owner is
/// logged in. Callers run this on a timer (see [`SessionMonitor`]) so such a
/// session ends on its next check instead of lasting until logout.
pub async fn check_session_liveness(store: &Store) -> Result<Liveness> {
    let Some(session) = store.load_session().await? else {
        return Ok(Liveness::NoSession);
    };

    let alive = store
        .find_user(&session.email)
        .await?
        .is_some_and(|u| u.is_active);

    if alive {
        return Ok(Liveness::Alive(session));
    }

    warn!(
        "Access revoked for {}; closing session",
        normalize_email(&session.email)
    );
    store.clear_session().await?;
    Ok(Liveness::Revoked {
        email: session.email,
    })
}

/// Shortest polling period; `interval` cannot run with a zero period.
const MIN_CHECK_PERIOD: Duration = Duration::from_millis(10);

/// Background task running [`check_session_liveness`] at a fixed interval.
///
/// The task ends on its own once the session is revoked or closed, or when
/// [`SessionMonitor::stop`] is called.
#[derive(Debug)]
pub struct SessionMonitor {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<Option<Liveness>>>,
}

impl SessionMonitor {
    /// Starts polling. Must be called from within a tokio runtime. Periods
    /// below ten milliseconds, zero included, are raised to ten milliseconds.
    #[must_use]
    pub fn spawn(store: Store, period: Duration) -> Self {
        let (shutdown, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period.max(MIN_CHECK_PERIOD));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("Session monitor stopped");
                        return Ok(None);
                    }
                    _ = ticker.tick() => {
                        match check_session_liveness(&store).await? {
                            Liveness::Alive(_) => {}
                            ended => return Ok(Some(ended)),
                        }
                    }
                }
            }
        });

        Self {
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// Whether the polling task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels polling and waits for the task. Returns how the session ended
    /// if that happened before the stop took effect.
    pub async fn stop(mut self) -> Result<Option<Liveness>> {
        if let Some(tx) = self.shutdown.take() {
            // The task may already have exited; nothing to cancel then.
            let _ = tx.send(());
        }
        self.handle.await?
    }

    /// Waits for the task to end by itself.
    pub async fn join(self) -> Result<Option<Liveness>> {
        self.handle.await?
    }
}
