mod delete_test;
mod find_test;
mod index_test;
mod insert_test;
mod update_test;
