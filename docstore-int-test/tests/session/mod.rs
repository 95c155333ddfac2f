mod instance_test;
mod session_test;
