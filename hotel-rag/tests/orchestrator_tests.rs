//! End-to-end answering tests against in-memory datasets and mock capabilities.

mod common;

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{
    DownEmbedder, DownGenerator, HashEmbedder, RecordingGenerator, SlowGenerator,
    bookings_with_revenue, bookings_without_revenue,
};
use hotel_rag::{
    AnswerOrchestrator, AnswerSource, ConfigError, ContextPolicy, Generator, HotelRagConfig,
    HotelRagError, Intent, KnowledgeBase, LoadError, SimilarityIndex, Snapshot,
};

fn orchestrator(snapshot: Snapshot, generator: Arc<dyn Generator>) -> AnswerOrchestrator {
    AnswerOrchestrator::builder()
        .knowledge(Arc::new(KnowledgeBase::new(snapshot, None)))
        .generator(generator)
        .build()
        .unwrap()
}

#[tokio::test]
async fn booking_count_is_answered_from_data() {
    let generator = Arc::new(RecordingGenerator::new("unused"));
    let orchestrator = orchestrator(bookings_without_revenue(1000), generator.clone());

    let response = orchestrator.ask("How many bookings are there?").await;

    assert_eq!(response.text, "There are 1000 bookings in the dataset.");
    assert_eq!(response.source, AnswerSource::Deterministic);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn booking_count_ignores_case_and_spacing() {
    let orchestrator =
        orchestrator(bookings_without_revenue(4), Arc::new(RecordingGenerator::new("unused")));

    let answer = orchestrator.answer("  NUMBER   of Bookings?  ").await;
    assert_eq!(answer.intent, Some(Intent::BookingCount));
    assert_eq!(answer.text, "There are 4 bookings in the dataset.");
}

#[tokio::test]
async fn general_revenue_reports_total_and_average() {
    let orchestrator =
        orchestrator(bookings_with_revenue(), Arc::new(RecordingGenerator::new("unused")));

    let answer = orchestrator.answer("what's the total revenue").await;

    assert_eq!(answer.source, AnswerSource::Deterministic);
    assert_eq!(answer.intent, Some(Intent::Revenue));
    assert!(answer.text.contains("500000.00"), "{}", answer.text);
    assert!(answer.text.contains("166666.67"), "{}", answer.text);
}

#[tokio::test]
async fn month_without_bookings_reports_zero_revenue() {
    let orchestrator =
        orchestrator(bookings_with_revenue(), Arc::new(RecordingGenerator::new("unused")));

    let answer = orchestrator.answer("What was the revenue in July 2017?").await;

    assert_eq!(answer.intent, Some(Intent::RevenueForMonth));
    assert_eq!(answer.text, "The total revenue for July 2017 was $0.00.");
}

#[tokio::test]
async fn month_revenue_sums_matching_rows() {
    let orchestrator =
        orchestrator(bookings_with_revenue(), Arc::new(RecordingGenerator::new("unused")));

    let answer = orchestrator.answer("revenue for aug 2017").await;
    assert_eq!(answer.text, "The total revenue for August 2017 was $150000.00.");
}

#[tokio::test]
async fn revenue_question_without_revenue_column_is_deterministic_and_unavailable() {
    let generator = Arc::new(RecordingGenerator::new("unused"));
    let orchestrator = orchestrator(bookings_without_revenue(10), generator.clone());

    for question in ["What is the total revenue?", "Revenue in July 2017?"] {
        let answer = orchestrator.answer(question).await;
        assert_eq!(answer.source, AnswerSource::Deterministic);
        assert!(!answer.available);
        assert!(answer.text.contains("not available"), "{}", answer.text);
    }
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn unmatched_question_goes_to_generation_with_insights() {
    let generator = Arc::new(RecordingGenerator::new("Blue, probably."));
    let orchestrator = orchestrator(bookings_with_revenue(), generator.clone());

    let response = orchestrator.ask("what is your favorite color").await;

    assert_eq!(response.source, AnswerSource::Generated);
    assert_eq!(response.text, "Blue, probably.");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.starts_with("Hotel Bookings Data Insights:\n"));
    assert!(prompt.contains("Dataset contains 3 hotel bookings."));
    assert!(prompt.contains("Total revenue: $500000.00"));
    assert!(prompt.contains("Question: what is your favorite color"));
}

#[tokio::test]
async fn prompt_carries_the_question_as_asked() {
    let generator = Arc::new(RecordingGenerator::new("Sure."));
    let orchestrator = orchestrator(bookings_with_revenue(), generator.clone());

    orchestrator.answer("  Which Hotel is  quieter?\t").await;

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Question:   Which Hotel is  quieter?\t\n\n"), "{prompt}");
}

#[tokio::test]
async fn unreachable_generator_yields_error_answer() {
    let orchestrator = orchestrator(bookings_with_revenue(), Arc::new(DownGenerator));

    let response = orchestrator.ask("what is your favorite color").await;

    assert_eq!(response.source, AnswerSource::Error);
    assert!(response.text.starts_with("Error: "));
    assert!(response.text.contains("connection refused"));
}

#[tokio::test]
async fn empty_generation_yields_error_answer() {
    let orchestrator =
        orchestrator(bookings_with_revenue(), Arc::new(RecordingGenerator::new("   ")));

    let answer = orchestrator.answer("tell me a story").await;
    assert_eq!(answer.source, AnswerSource::Error);
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out() {
    let config =
        HotelRagConfig::builder().generate_timeout(Duration::from_secs(5)).build().unwrap();
    let orchestrator = AnswerOrchestrator::builder()
        .config(config)
        .knowledge(Arc::new(KnowledgeBase::new(bookings_with_revenue(), None)))
        .generator(Arc::new(SlowGenerator(Duration::from_secs(60))))
        .build()
        .unwrap();

    let answer = orchestrator.answer("what should I pack").await;

    assert_eq!(answer.source, AnswerSource::Error);
    assert!(answer.text.contains("timed out"), "{}", answer.text);
}

#[tokio::test]
async fn empty_question_is_an_error_answer() {
    let generator = Arc::new(RecordingGenerator::new("unused"));
    let orchestrator = orchestrator(bookings_with_revenue(), generator.clone());

    let answer = orchestrator.answer("   ").await;
    assert_eq!(answer.source, AnswerSource::Error);
    assert!(generator.prompts().is_empty());
}

async fn indexed(
    snapshot: Snapshot,
    policy: ContextPolicy,
) -> (AnswerOrchestrator, Arc<HashEmbedder>, Arc<RecordingGenerator>) {
    let embedder = Arc::new(HashEmbedder::new(6));
    let config = HotelRagConfig::builder().top_k(2).context_policy(policy).build().unwrap();
    let index = SimilarityIndex::build(&snapshot, embedder.as_ref(), &config).await.unwrap();
    let generator = Arc::new(RecordingGenerator::new("An answer."));

    let orchestrator = AnswerOrchestrator::builder()
        .config(config)
        .knowledge(Arc::new(KnowledgeBase::new(snapshot, Some(index))))
        .embedding_provider(embedder.clone())
        .generator(generator.clone())
        .build()
        .unwrap();
    (orchestrator, embedder, generator)
}

#[tokio::test]
async fn retrieved_fragments_are_added_to_the_prompt() {
    let (orchestrator, _, generator) =
        indexed(bookings_without_revenue(8), ContextPolicy::InsightsAndFragments).await;

    orchestrator.answer("Tell me about bookings from Portugal").await;

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Dataset contains 8 hotel bookings."));
    let section = prompt.split("Relevant Bookings:\n").nth(1).unwrap();
    let listed = section.lines().take_while(|l| l.starts_with("- Booking from ")).count();
    assert_eq!(listed, 2);
}

#[tokio::test]
async fn fragments_only_policy_omits_insights() {
    let (orchestrator, _, generator) =
        indexed(bookings_without_revenue(8), ContextPolicy::FragmentsOnly).await;

    orchestrator.answer("Tell me about resort stays").await;

    let prompt = &generator.prompts()[0];
    assert!(!prompt.contains("Data Insights"));
    assert!(prompt.contains("Relevant Bookings:\n- Booking from "));
}

#[tokio::test]
async fn matched_intents_never_touch_capabilities() {
    let (orchestrator, embedder, generator) =
        indexed(bookings_without_revenue(8), ContextPolicy::InsightsAndFragments).await;
    let calls_after_build = embedder.calls.load(Ordering::SeqCst);

    for question in [
        "how many bookings?",
        "what is the date range?",
        "how many guests stayed?",
        "what is the cancellation rate?",
        "which countries book the most?",
    ] {
        let answer = orchestrator.answer(question).await;
        assert_eq!(answer.source, AnswerSource::Deterministic, "{question}");
    }

    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_build);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn failed_question_embedding_falls_back_to_insights() {
    let snapshot = bookings_without_revenue(4);
    let index = SimilarityIndex::build(&snapshot, &HashEmbedder::new(3), &HotelRagConfig::default())
        .await
        .unwrap();
    let generator = Arc::new(RecordingGenerator::new("Still answered."));
    let orchestrator = AnswerOrchestrator::builder()
        .knowledge(Arc::new(KnowledgeBase::new(snapshot, Some(index))))
        .embedding_provider(Arc::new(DownEmbedder))
        .generator(generator.clone())
        .build()
        .unwrap();

    let answer = orchestrator.answer("anything unusual?").await;

    assert_eq!(answer.source, AnswerSource::Generated);
    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Dataset contains 4 hotel bookings."));
    assert!(!prompt.contains("Relevant Bookings"));
}

#[tokio::test]
async fn concurrent_questions_share_one_knowledge_base() {
    let generator = Arc::new(RecordingGenerator::new("Generated."));
    let orchestrator = Arc::new(orchestrator(bookings_without_revenue(25), generator.clone()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                let question =
                    if i % 2 == 0 { "how many bookings" } else { "why do people travel" };
                orchestrator.ask(question).await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap();
        if i % 2 == 0 {
            assert_eq!(response.text, "There are 25 bookings in the dataset.");
        } else {
            assert_eq!(response.source, AnswerSource::Generated);
        }
    }
    assert_eq!(generator.prompts().len(), 8);
}

#[tokio::test]
async fn swapping_knowledge_changes_answers_without_touching_the_old_one() {
    let config = HotelRagConfig::builder().top_k(4).build().unwrap();
    let old = AnswerOrchestrator::builder()
        .config(config.clone())
        .knowledge(Arc::new(KnowledgeBase::new(bookings_without_revenue(5), None)))
        .generator(Arc::new(RecordingGenerator::new("x")))
        .build()
        .unwrap();
    let new = old.with_knowledge(Arc::new(KnowledgeBase::new(bookings_without_revenue(9), None)));

    assert_eq!(new.config(), &config);
    assert_eq!(old.knowledge().snapshot().row_count(), 5);

    assert_eq!(old.ask("how many bookings").await.text, "There are 5 bookings in the dataset.");
    assert_eq!(new.ask("how many bookings").await.text, "There are 9 bookings in the dataset.");
}

#[tokio::test]
async fn knowledge_base_loads_from_csv_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "hotel,country,arrival_date,adr,is_canceled,revenue,adults,children,babies\n\
         city hotel,prt,2017-07-01,100,0,250.50,2,1,0\n\
         resort hotel,gbr,2017-07-15,80,1,0,2,0,1\n"
    )
    .unwrap();

    let embedder = HashEmbedder::new(4);
    let config = HotelRagConfig::default();
    let knowledge = KnowledgeBase::load(file.path(), Some(&embedder), &config).await.unwrap();

    assert_eq!(knowledge.snapshot().row_count(), 2);
    assert_eq!(knowledge.index().map(|i| i.len()), Some(2));
    assert_eq!(
        knowledge.insights().lines(),
        vec![
            "Dataset contains 2 hotel bookings.",
            "Date range: 2017-07-01 to 2017-07-15",
            "Total revenue: $250.50",
            "Average booking revenue: $125.25",
            "Total guests: 4 adults, 1 children, 1 babies",
        ]
    );
}

#[tokio::test]
async fn missing_file_is_a_load_error() {
    let err = KnowledgeBase::load("/nonexistent/bookings.csv", None, &HotelRagConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HotelRagError::Load(LoadError::Io { .. })));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_loading() {
    let config = HotelRagConfig { top_k: 0, ..HotelRagConfig::default() };
    let err = KnowledgeBase::load("/nonexistent/bookings.csv", None, &config).await.unwrap_err();
    assert!(matches!(err, HotelRagError::Config(ConfigError::Invalid(_))));
}
