mod check_tests;
mod common;
mod init_tests;
