use serde::{Deserialize, Serialize};

/// Supabase project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub url: String,
    /// Public anon key sent as `apikey` and as the bearer before sign-in
    pub anon_key: String,
    pub request_timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            request_timeout_secs: 10,
        }
    }
}
