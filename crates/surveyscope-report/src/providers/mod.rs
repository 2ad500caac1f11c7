pub mod gotenberg;
pub mod local;
pub mod resend;
pub mod supabase;

pub use gotenberg::GotenbergPdfRenderer;
pub use local::LocalDocumentStore;
pub use resend::ResendMailer;
pub use supabase::SupabaseDocumentStore;
