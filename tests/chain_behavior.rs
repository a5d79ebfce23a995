//! Behavior-driven tests for budgeted chains and the composed quote lookup.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::ScriptedProvider;
use hedge_core::{
    step_fn, Address, BudgetedChain, Cep, DeadlineScope, DollarQuote, Failure, FailureKind,
    MemorySink, ProviderId, QuoteService, RaceCoordinator, RaceStep, StageStatus,
};
use tokio::time::Instant;

fn sample_quote() -> DollarQuote {
    DollarQuote {
        code: String::from("USD"),
        codein: String::from("BRL"),
        name: String::from("Dólar Americano/Real Brasileiro"),
        high: String::from("5.0601"),
        low: String::from("5.0245"),
        var_bid: String::from("0.0108"),
        pct_change: String::from("0.21"),
        bid: String::from("5.0503"),
        ask: String::from("5.0513"),
        timestamp: String::from("1715371195"),
        create_date: String::from("2024-05-10 16:59:55"),
    }
}

fn sample_address() -> Address {
    Address {
        cep: Cep::parse("22461000").expect("cep"),
        street: String::from("Rua Jardim Botânico"),
        neighborhood: String::from("Jardim Botânico"),
        city: String::from("Rio de Janeiro"),
        state: String::from("RJ"),
        provider: ProviderId::new("scripted"),
    }
}

// =============================================================================
// Quote chain: stage-specific timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_the_api_call_exceeds_200ms_the_quote_fails_with_an_outbound_call_timeout() {
    // Given: An upstream that needs 500ms and a 200ms call budget
    let upstream = ScriptedProvider::succeeding("awesomeapi", 500, sample_quote());
    let sink = Arc::new(MemorySink::<DollarQuote>::new());
    let service = QuoteService::new(upstream.shared(), sink.clone())
        .with_budgets(Duration::from_millis(200), Duration::from_millis(10));
    let started = Instant::now();

    // When: The latest quote is requested
    let report = service.latest_traced(&DeadlineScope::root()).await;

    // Then: The call stage times out at 200ms and persistence never runs
    let failure = report.outcome.expect_err("call budget elapses");
    assert_eq!(failure, Failure::timeout(QuoteService::OUTBOUND_CALL));
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_millis(210));
    assert_eq!(report.stages.len(), 1);
    assert!(sink.stored().is_empty());
}

#[tokio::test(start_paused = true)]
async fn when_persistence_exceeds_its_1ms_budget_the_quote_fails_with_a_persistence_timeout() {
    // Given: A fast upstream and a sink slower than its 1ms budget
    let upstream = ScriptedProvider::succeeding("awesomeapi", 20, sample_quote());
    let sink = Arc::new(MemorySink::<DollarQuote>::new().with_latency(Duration::from_millis(25)));
    let service = QuoteService::new(upstream.shared(), sink.clone())
        .with_budgets(Duration::from_millis(200), Duration::from_millis(1));

    // When: The latest quote is requested
    let report = service.latest_traced(&DeadlineScope::root()).await;

    // Then: The failure names the persistence stage, not the call
    let failure = report.outcome.expect_err("persistence budget elapses");
    assert_eq!(failure.kind(), FailureKind::Timeout);
    assert_eq!(failure.stage(), Some(QuoteService::PERSISTENCE));
    assert_eq!(report.stages[0].status, StageStatus::Succeeded);
    assert_eq!(report.stages[1].status, StageStatus::Failed);
    assert!(sink.stored().is_empty(), "no partial write escapes");
}

#[tokio::test(start_paused = true)]
async fn when_the_request_budget_runs_out_first_the_in_flight_call_times_out() {
    // Given: A 100ms request budget around a 200ms call budget and a 150ms upstream
    let upstream = ScriptedProvider::succeeding("awesomeapi", 150, sample_quote());
    let sink = Arc::new(MemorySink::<DollarQuote>::new());
    let service = QuoteService::new(upstream.shared(), sink.clone())
        .with_budgets(Duration::from_millis(200), Duration::from_millis(10))
        .with_request_budget(Duration::from_millis(100));
    let started = Instant::now();

    // When: The latest quote is requested
    let report = service.latest_traced(&DeadlineScope::root()).await;

    // Then: The call stage is cut at 100ms, well before its own budget
    let failure = report.outcome.expect_err("request budget elapses");
    assert_eq!(failure, Failure::timeout(QuoteService::OUTBOUND_CALL));
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_millis(110));
    assert!(sink.stored().is_empty());
}

#[tokio::test(start_paused = true)]
async fn the_request_budget_also_bounds_persistence() {
    // Given: Steps that fit their own budgets but not the 30ms request budget
    let upstream = ScriptedProvider::succeeding("awesomeapi", 20, sample_quote());
    let sink = Arc::new(MemorySink::<DollarQuote>::new().with_latency(Duration::from_millis(25)));
    let service = QuoteService::new(upstream.shared(), sink.clone())
        .with_budgets(Duration::from_millis(200), Duration::from_millis(50))
        .with_request_budget(Duration::from_millis(30));

    // When: The latest quote is requested
    let report = service.latest_traced(&DeadlineScope::root()).await;

    // Then: Persistence is the stage that loses the remaining 10ms
    let failure = report.outcome.expect_err("request budget elapses");
    assert_eq!(failure, Failure::timeout(QuoteService::PERSISTENCE));
    assert_eq!(report.stages[0].status, StageStatus::Succeeded);
    assert_eq!(report.stages[1].status, StageStatus::Failed);
    assert!(sink.stored().is_empty());
}

#[tokio::test(start_paused = true)]
async fn when_both_stages_fit_their_budgets_the_stored_quote_is_returned() {
    let upstream = ScriptedProvider::succeeding("awesomeapi", 20, sample_quote());
    let sink = Arc::new(MemorySink::<DollarQuote>::new());
    let service = QuoteService::new(upstream.shared(), sink.clone());

    let quote = service
        .latest(&DeadlineScope::root())
        .await
        .expect("quote stored");

    assert_eq!(quote.bid, "5.0503");
    assert_eq!(sink.stored(), vec![sample_quote()]);
}

#[tokio::test(start_paused = true)]
async fn an_upstream_failure_keeps_its_kind_and_gains_the_stage_name() {
    let upstream = ScriptedProvider::<DollarQuote>::failing(
        "awesomeapi",
        5,
        Failure::empty_result("no quotes found"),
    );
    let service = QuoteService::new(upstream.shared(), Arc::new(MemorySink::<DollarQuote>::new()));

    let failure = service
        .latest(&DeadlineScope::root())
        .await
        .expect_err("upstream empty");

    assert_eq!(failure.kind(), FailureKind::EmptyResult);
    assert_eq!(failure.stage(), Some(QuoteService::OUTBOUND_CALL));
}

// =============================================================================
// Chain: ordering and short-circuit
// =============================================================================

#[tokio::test(start_paused = true)]
async fn after_a_step_fails_later_steps_are_never_invoked() {
    // Given: A failing first step and a counting second step
    let invocations = Arc::new(AtomicUsize::new(0));
    let first = step_fn("first", Duration::from_millis(50), |_: (), _| async {
        Err::<u32, _>(Failure::transfer("upstream closed the connection"))
    });
    let second = {
        let invocations = invocations.clone();
        step_fn("second", Duration::from_millis(50), move |value: u32, _| {
            invocations.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }
        })
    };
    let mut chain = BudgetedChain::new();

    // When: Both steps are run in order
    let first_failure = chain.run(&first, ()).await.expect_err("first fails");
    let second_failure = chain.run(&second, 1).await.expect_err("short-circuits");

    // Then: The second step never ran and the first failure is reported again
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert_eq!(second_failure, first_failure);
    assert_eq!(second_failure.stage(), Some("first"));
    assert_eq!(chain.stages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn the_chain_clock_is_never_reset_between_steps() {
    // Given: A 300ms chain and two steps that each take 200ms of a 1s budget
    let slow = step_fn("slow", Duration::from_secs(1), |value: u32, _| async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(value + 1)
    });
    let mut chain = BudgetedChain::with_budget("chain", Duration::from_millis(300));

    // When: Both run
    let first = chain.run(&slow, 0).await.expect("first fits");
    let failure = chain.run(&slow, first).await.expect_err("second overruns the chain");

    // Then: The second step is cut off by the remaining 100ms, not its own budget
    assert_eq!(failure, Failure::timeout("slow"));
    assert!(chain.stages()[1].elapsed_ms < 110);
}

#[tokio::test(start_paused = true)]
async fn cancelling_the_caller_scope_expires_the_running_step() {
    let parent = DeadlineScope::root();
    let step = step_fn("waiting", Duration::from_secs(60), |_: (), _| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    });

    let canceller = {
        let parent = parent.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(15)).await;
            parent.cancel();
        })
    };
    let mut chain = BudgetedChain::within(&parent);
    let failure = chain.run(&step, ()).await.expect_err("caller cancelled");
    canceller.await.expect("canceller joins");

    assert_eq!(failure, Failure::timeout("waiting"));
}

// =============================================================================
// Chain: nested composition
// =============================================================================

#[tokio::test(start_paused = true)]
async fn a_race_can_be_the_first_step_of_a_chain() {
    // Given: A locate step racing a fast and a slow provider
    let fast = ScriptedProvider::succeeding("fast", 30, sample_address());
    let slow = ScriptedProvider::succeeding("slow", 400, sample_address());
    let race = RaceCoordinator::new(vec![fast.shared(), slow.shared()]).expect("providers");
    let locate = RaceStep::new("locate", Duration::from_millis(100), race);
    let city_len = step_fn("measure", Duration::from_millis(10), |address: Address, _| async move {
        Ok(address.city.len())
    });
    let mut chain = BudgetedChain::with_budget("weather", Duration::from_secs(1));

    // When: The chain runs the race and then a dependent step
    let address = chain
        .run(&locate, Cep::parse("22461000").expect("cep"))
        .await
        .expect("race wins");
    let len = chain.run(&city_len, address).await.expect("measured");

    // Then: The race result flowed into the next step
    assert_eq!(len, "Rio de Janeiro".len());
}

#[tokio::test(start_paused = true)]
async fn a_race_step_that_runs_out_of_time_reports_the_step_name() {
    let slow = ScriptedProvider::succeeding("slow", 400, sample_address());
    let race = RaceCoordinator::new(vec![slow.shared()]).expect("providers");
    let locate = RaceStep::new("locate", Duration::from_millis(100), race);
    let mut chain = BudgetedChain::new();

    let failure = chain
        .run(&locate, Cep::parse("22461000").expect("cep"))
        .await
        .expect_err("race times out");

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(failure, Failure::timeout("locate"));
    assert!(slow.cancelled());
}

#[tokio::test(start_paused = true)]
async fn nested_chains_never_outlive_their_ancestors() {
    let outer = DeadlineScope::new("outer", Duration::from_millis(120));
    let mut depth_one = BudgetedChain::within(&outer.child("one", Duration::from_secs(5)));
    let inner_scope = depth_one.scope().child("two", Duration::from_secs(5));
    let mut depth_two = BudgetedChain::within(&inner_scope);

    let sleeper = step_fn("sleeper", Duration::from_secs(5), |_: (), _| async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(())
    });
    let started = Instant::now();

    let failure = depth_two.run(&sleeper, ()).await.expect_err("outer deadline");
    let outer_failure = depth_one.run(&sleeper, ()).await.expect_err("already expired");

    assert_eq!(failure, Failure::timeout("sleeper"));
    assert_eq!(outer_failure, Failure::timeout("sleeper"));
    assert!(started.elapsed() < Duration::from_millis(130));
}
