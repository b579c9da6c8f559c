
mod dispatcher_test;
mod resend_test;
mod router_test;
