mod test_concurrent_join;
