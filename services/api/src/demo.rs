use crate::infra::{
    seed_demo_board, BroadcastPublisher, InMemoryApplyRepository, InMemoryNotificationStore,
    DEMO_AGENT, DEMO_COMPANY,
};
use clap::Args;
use job_board::error::AppError;
use job_board::workflows::applies::{
    Agent, ApplyId, ApplyPage, ApplyWorkflowError, ApplyWorkflowService, PageRequest,
    StatusFilter, TransitionOutcome,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Message sent to candidates whose application moves forward
    #[arg(long, default_value = "Thank you for applying. We'd like to talk to you next week.")]
    pub(crate) response: String,
    /// Stop after the accept transitions
    #[arg(long)]
    pub(crate) skip_reject: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        response,
        skip_reject,
    } = args;

    let repository = Arc::new(InMemoryApplyRepository::default());
    seed_demo_board(&repository)?;
    let inbox = Arc::new(InMemoryNotificationStore::default());
    let publisher = Arc::new(BroadcastPublisher::new(32));
    let mut channel = publisher.subscribe();
    let service = ApplyWorkflowService::new(repository, inbox.clone(), publisher);

    let agent = Agent {
        user_id: DEMO_AGENT,
        company_id: DEMO_COMPANY,
    };

    println!("Application review workflow demo");
    render_dashboard(
        "Dashboard before review",
        &service.list(DEMO_COMPANY, StatusFilter::All, PageRequest::default())?,
    );

    println!("\nAgent decisions");
    report(
        "advance #1",
        service.advance(agent, ApplyId(1), Some(response.clone())),
    );
    report("advance #2", service.advance(agent, ApplyId(2), Some(response)));
    if !skip_reject {
        report("reject #3", service.reject(agent, ApplyId(3)));
    }
    report("advance #4", service.advance(agent, ApplyId(4), None));

    println!("\nReal-time channel");
    let mut delivered = 0;
    while let Ok(event) = channel.try_recv() {
        delivered += 1;
        println!(
            "- {} -> user {} [{}]",
            event.name,
            event.payload.receiver_id.0,
            event.payload.kind.label()
        );
    }
    if delivered == 0 {
        println!("- no events delivered");
    }

    render_dashboard(
        "\nDashboard after review",
        &service.list(DEMO_COMPANY, StatusFilter::All, PageRequest::default())?,
    );

    println!("\nCandidate inboxes");
    let page = service.list(DEMO_COMPANY, StatusFilter::All, PageRequest::default())?;
    for item in &page.items {
        for notification in inbox.for_receiver(item.user_id) {
            println!("- {}: {}", item.applicant_name, notification.message);
        }
    }

    Ok(())
}

fn report(label: &str, result: Result<TransitionOutcome, ApplyWorkflowError>) {
    match result {
        Ok(outcome) => println!(
            "- {label}: {} -> {} (notification #{} {})",
            outcome.previous_status,
            outcome.apply.status,
            outcome.notification.id.0,
            outcome.notification.kind.label()
        ),
        Err(err) => println!("- {label}: refused ({err})"),
    }
}

fn render_dashboard(title: &str, page: &ApplyPage) {
    println!("{title} ({} applies)", page.total);
    for item in &page.items {
        let actions = if item.actions_enabled {
            "actions open"
        } else {
            "closed"
        };
        println!(
            "- #{} {} | {} | {} | {}",
            item.id.0, item.applicant_name, item.job_title, item.status_label, actions
        );
    }
}
