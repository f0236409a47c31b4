//! Session bootstrap, verification and route guarding for the dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod bootstrap;
mod establishment;
mod guard;
mod identity;
mod state;
mod token;
mod verifier;

pub use bootstrap::{BootstrapOutcome, Bootstrapper, NavigationEffect};
pub use establishment::EstablishmentSelector;
pub use guard::{GuardDecision, GuardOptions, RouteGuard};
pub use identity::{EstablishmentMembership, UserIdentity};
pub use state::{AuthState, SessionHandle};
pub use token::{ResolvedToken, TokenResolver, TokenSource, UrlParams};
pub use verifier::{HttpIdentityVerifier, IdentityVerifier};
