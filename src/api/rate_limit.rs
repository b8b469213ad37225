use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Tracked clients before idle entries are pruned
const PRUNE_THRESHOLD: usize = 10_000;

/// Keyed limiter with its clock, so denials can be turned into a wait time
struct KeyedQuota<C: Clock> {
    limiter: RateLimiter<IpAddr, DashMapStateStore<IpAddr>, C, NoOpMiddleware<C::Instant>>,
    clock: C,
}

trait ClientQuota: Send + Sync {
    /// `Err` carries the time until the next request would be admitted
    fn check(&self, client: IpAddr) -> std::result::Result<(), Duration>;
}

impl<C> ClientQuota for KeyedQuota<C>
where
    C: Clock + Send + Sync,
    C::Instant: Send + Sync,
{
    fn check(&self, client: IpAddr) -> std::result::Result<(), Duration> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

/// Per-client request quota keyed by peer address
#[derive(Clone)]
pub struct ClientRateLimiter {
    quota: Arc<dyn ClientQuota>,
    limit: u32,
}

impl ClientRateLimiter {
    /// `limit` requests per minute, all of which may arrive in one burst
    pub fn per_minute(limit: u32) -> Self {
        Self::per_minute_with_clock(limit, DefaultClock::default())
    }

    /// Same quota on a caller-supplied clock
    pub fn per_minute_with_clock<C>(limit: u32, clock: C) -> Self
    where
        C: Clock + Send + Sync + 'static,
        C::Instant: Send + Sync,
    {
        let limit = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::dashmap_with_clock(Quota::per_minute(limit), &clock);

        Self {
            quota: Arc::new(KeyedQuota { limiter, clock }),
            limit: limit.get(),
        }
    }

    /// Count one request from `client`, failing once the quota is used up
    pub fn check(&self, client: IpAddr) -> Result<()> {
        match self.quota.check(client) {
            Ok(()) => {
                debug!("Admitted request from {}", client);
                Ok(())
            }
            Err(wait) => {
                let retry_after = wait.as_secs_f64().ceil().max(1.0) as u64;
                warn!(
                    "Rate limit exceeded for {} (retry in {}s)",
                    client, retry_after
                );
                Err(Error::RateLimitExceeded {
                    limit: self.limit,
                    window_secs: 60,
                    retry_after_secs: retry_after,
                })
            }
        }
    }
}

/// Peer address set by `into_make_service_with_connect_info`, else localhost
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Middleware rejecting requests over quota before any handler runs
pub async fn enforce(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response> {
    limiter.check(client_ip(&request))?;
    Ok(next.run(request).await)
}
