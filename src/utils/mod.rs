pub mod provider_factory;

pub use provider_factory::ProviderFactory;
