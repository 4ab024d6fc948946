mod find_test;
mod index_equivalence_test;
mod sort_test;
