pub mod applies;
