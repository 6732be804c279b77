pub mod s3;
pub mod supabase_storage;
