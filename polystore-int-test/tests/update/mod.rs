mod array_update_test;
mod numeric_update_test;
mod update_test;
