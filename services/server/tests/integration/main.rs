mod gate_test;
mod helpers;
mod sessions_test;
mod users_test;
