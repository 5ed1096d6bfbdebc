//! Static address reallocation
//!
//! Obtains a fresh public address for a region and attaches it to the
//! region's replacement instance. Reservations are named `static-{region}`
//! and outlive a cycle, so finding the name taken is the normal case: the old
//! reservation is released and allocation is retried exactly once.
//!
//! ```text
//! Allocating ──ok──────────────────────────► Attaching ──► Reading ──► Done
//!     │                                          ▲
//!     └─name in use─► Releasing ─► Retrying ─ok──┘
//!                         │            │
//!                         └────────────┴──err──► Failed
//! ```

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::cloud::{reservation_name, AddressProvider, CloudError};

/// Errors from a reallocation attempt
#[derive(Debug, thiserror::Error)]
pub enum ReallocationError {
    /// No reservation could be created
    #[error("Reallocation failed in {region}: {reason}")]
    ReallocationFailed { region: String, reason: String },

    /// A reservation exists but could not be attached
    #[error("Attaching {region} address to {instance} failed: {reason}")]
    AttachmentFailed {
        region: String,
        instance: String,
        reason: String,
    },

    /// The attached reservation could not be read back
    #[error("Reading back {region} address failed: {reason}")]
    ReadBackFailed { region: String, reason: String },
}

/// Step of the reallocation state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReallocationState {
    /// First allocation attempt
    Allocating,
    /// Releasing the reservation that holds the name
    Releasing,
    /// Second and last allocation attempt
    Retrying,
    /// Attaching the new reservation to the instance
    Attaching,
    /// Reading back the assigned address
    Reading,
    /// Finished with an address
    Done(IpAddr),
}

impl fmt::Display for ReallocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocating => f.write_str("allocating"),
            Self::Releasing => f.write_str("releasing"),
            Self::Retrying => f.write_str("retrying"),
            Self::Attaching => f.write_str("attaching"),
            Self::Reading => f.write_str("reading"),
            Self::Done(addr) => write!(f, "done ({addr})"),
        }
    }
}

/// Drives allocate → (release → retry) → attach → read against a provider
pub struct Reallocator {
    provider: Arc<dyn AddressProvider>,
}

impl Reallocator {
    pub fn new(provider: Arc<dyn AddressProvider>) -> Self {
        Self { provider }
    }

    /// Obtain a fresh address in `region` attached to `instance`
    ///
    /// Safe to call repeatedly for the same region; each call yields a new
    /// address and leaves exactly one reservation under the region's name.
    ///
    /// # Errors
    ///
    /// - [`ReallocationError::ReallocationFailed`] if allocation fails for a
    ///   reason other than a name conflict, if the release fails, or if the
    ///   single retry fails
    /// - [`ReallocationError::AttachmentFailed`] if attaching fails
    /// - [`ReallocationError::ReadBackFailed`] if the address cannot be read
    pub async fn reallocate(
        &self,
        region: &str,
        instance: &str,
    ) -> Result<IpAddr, ReallocationError> {
        let name = reservation_name(region);
        let mut state = ReallocationState::Allocating;

        loop {
            tracing::debug!(region, reservation = %name, state = %state, "Reallocation step");

            state = match state {
                ReallocationState::Allocating => match self.provider.allocate(region, &name).await
                {
                    Ok(()) => ReallocationState::Attaching,
                    Err(CloudError::NameInUse(_)) => {
                        tracing::info!(region, reservation = %name, "Reservation exists, releasing it");
                        ReallocationState::Releasing
                    }
                    Err(e) => return Err(failed(region, e)),
                },

                ReallocationState::Releasing => match self.provider.release(region, &name).await {
                    Ok(()) => {
                        tracing::info!(region, reservation = %name, "Released previous reservation");
                        ReallocationState::Retrying
                    }
                    Err(e) => return Err(failed(region, e)),
                },

                ReallocationState::Retrying => match self.provider.allocate(region, &name).await {
                    Ok(()) => ReallocationState::Attaching,
                    Err(e) => return Err(failed(region, e)),
                },

                ReallocationState::Attaching => {
                    match self.provider.attach(region, &name, instance).await {
                        Ok(()) => {
                            tracing::info!(region, instance, "Attached new static address");
                            ReallocationState::Reading
                        }
                        Err(e) => {
                            return Err(ReallocationError::AttachmentFailed {
                                region: region.to_string(),
                                instance: instance.to_string(),
                                reason: e.to_string(),
                            })
                        }
                    }
                }

                ReallocationState::Reading => {
                    let address = self.provider.get(region, &name).await.map_err(|e| {
                        ReallocationError::ReadBackFailed {
                            region: region.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    let ip = address.ip_address.parse::<IpAddr>().map_err(|e| {
                        ReallocationError::ReadBackFailed {
                            region: region.to_string(),
                            reason: format!("invalid address {:?}: {e}", address.ip_address),
                        }
                    })?;
                    ReallocationState::Done(ip)
                }

                ReallocationState::Done(ip) => {
                    tracing::info!(region, address = %ip, "Obtained new static address");
                    return Ok(ip);
                }
            };
        }
    }
}

fn failed(region: &str, error: CloudError) -> ReallocationError {
    ReallocationError::ReallocationFailed {
        region: region.to_string(),
        reason: error.to_string(),
    }
}
