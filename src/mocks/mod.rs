pub mod mock_gateway;

pub use mock_gateway::MockPaymentGateway;
