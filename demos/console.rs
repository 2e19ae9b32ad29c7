use std::error::Error;
use std::sync::Arc;

use log_facade::init::init_tracing;
use log_facade::tracing_sink::TracingSink;
use log_facade::{
    log_error, log_information, Fault, Logger, LoggerConfig, ParameterBag, RequestInfo,
    ThreadRequestContext,
};

struct CheckoutService {
    logger: Logger<CheckoutService>,
}

impl CheckoutService {
    fn submit(&self, order_id: u64) -> Result<(), Box<dyn Error>> {
        let params = ParameterBag::new().with("order_id", order_id).with("coupon", None::<String>);
        log_information!(self.logger, "submitting order", &params)?;

        let err = Fault::new("PaymentDeclined", "card declined")
            .with_data("order_id", order_id)
            .with_inner(Fault::new("GatewayTimeout", "gateway did not answer in 5s"));
        log_error!(self.logger, &err, "checkout failed", &params)?;
        Err(err.into())
    }
}

fn main() {
    init_tracing();

    let config = LoggerConfig::from_env().unwrap_or_default();
    let logger = Logger::new(Arc::new(TracingSink::new()))
        .with_context(Arc::new(ThreadRequestContext))
        .with_config(config);

    let service = CheckoutService { logger };

    let _request = RequestInfo::new()
        .with_remote_address("203.0.113.7")
        .with_username("alice")
        .with_request_path("/checkout")
        .enter();

    if let Err(e) = service.submit(42) {
        println!("submit returned: {e}");
    }
}
