mod helpers;
mod tenant_test;
