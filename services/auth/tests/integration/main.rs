mod account_test;
mod helpers;
mod router_test;
mod token_test;
