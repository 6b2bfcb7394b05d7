use chrono::Local;
use money_commander::{
    gateway::MockAgentGateway,
    models::{Leak, QuestionId, RiskAnswer},
    runtime::{FieldInput, RawAmount, SessionRuntime},
    state::InMemorySessionStore,
    wizard::WizardConfig,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    info!("Money Commander offline walkthrough starting");

    let runtime = SessionRuntime::open(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(MockAgentGateway::new()),
        WizardConfig::default(),
    )
    .await?;

    runtime.start().await?;

    // The Intel
    runtime
        .apply_input(FieldInput::Income(RawAmount::Text("80000".into())))
        .await?;
    runtime
        .apply_input(FieldInput::FixedBills(RawAmount::Text("45000".into())))
        .await?;
    runtime.apply_input(FieldInput::ToggleLeak(Leak::Dining)).await?;
    runtime.continue_screen().await?;

    // The Shield
    runtime.apply_input(FieldInput::EmergencyFundMonths(6)).await?;
    runtime.continue_screen().await?;

    // The Deployment
    runtime.apply_input(FieldInput::FocusGoal).await?;
    runtime
        .apply_input(FieldInput::FinancialGoal("Buy a home in 10 years".into()))
        .await?;
    runtime.apply_input(FieldInput::SipAmount(15_000)).await?;
    runtime.apply_input(FieldInput::SipYears(15)).await?;
    runtime.continue_screen().await?;

    // The Recon
    for (question, answer) in [
        (QuestionId::Q1, RiskAnswer::Moderate),
        (QuestionId::Q2, RiskAnswer::Aggressive),
        (QuestionId::Q3, RiskAnswer::Moderate),
    ] {
        runtime
            .apply_input(FieldInput::QuizAnswer { question, answer })
            .await?;
    }
    runtime.continue_screen().await?;
    runtime.settle().await;

    let messages: Vec<String> = runtime
        .view(|c| {
            c.log()
                .messages()
                .map(|m| format!("[{}] {}", m.agent_name, m.text))
                .collect()
        })
        .await;

    println!("\n=== ADVISOR PANEL ===");
    for message in &messages {
        println!("  {}", message);
    }

    println!("\n=== BATTLE PLAN ===");
    println!("{}", runtime.battle_plan(Local::now().date_naive()).await);

    Ok(())
}
