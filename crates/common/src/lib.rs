pub mod auth;
pub mod domain;
pub mod garde;
pub mod supabase;
pub mod telemetry;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use auth::MockIdentityProvider;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockInterestRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockOpportunityRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockSavedOpportunityRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockUserRepository;
