use std::env;
use std::fs::File;
use std::io;
use std::sync::Arc;
use xacml_pdp::{FlatPolicyLocator, PolicyDecisionPoint, PolicyFactory, RequestContext};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let policy_path = match env::var("XACML_POLICY") {
        Ok(value) => value,
        Err(_) => {
            eprintln!("XACML_POLICY is not set. Skipping.");
            eprintln!("Example: XACML_POLICY=policy.xml XACML_REQUEST=request.xml");
            return Ok(());
        }
    };
    let request_path = env::var("XACML_REQUEST").unwrap_or_else(|_| "request.xml".to_string());

    let factory = PolicyFactory::new();
    let policy = match env::var("XACML_POLICY_SET") {
        Ok(_) => factory.create_policy_set(File::open(&policy_path)?)?,
        Err(_) => factory.create_policy(File::open(&policy_path)?)?,
    };

    let mut pdp = PolicyDecisionPoint::new();
    pdp.set_policies(vec![Arc::new(policy)]);
    pdp.add_locator(FlatPolicyLocator::new());

    let mut context = RequestContext::new();
    context.read_request(File::open(&request_path)?)?;

    let response = pdp.evaluate(&context)?;
    println!("decision: {} ({})", response.decision(), response.decision_code());
    response.marshall(io::stdout().lock())?;
    println!();

    Ok(())
}
