pub mod local_temp_store;
