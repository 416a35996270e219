// ABOUTME: Checks that the re-exported macros emit structured fields
// ABOUTME: Uses tracing-mock so no global subscriber is installed

#[cfg(test)]
mod tests {
    use crate::{error, info, warn};
    use tracing_mock::{expect, subscriber};

    #[test]
    fn test_status_style_event_fields() {
        let (subscriber, handle) = subscriber::mock()
            .event(
                expect::event().with_fields(
                    expect::field("is_error")
                        .with_value(&true)
                        .and(expect::field("text").with_value(&"Failed to load project"))
                        .and(expect::msg("Status")),
                ),
            )
            .only()
            .run_with_handle();

        tracing::subscriber::with_default(subscriber, || {
            error!(is_error = true, text = "Failed to load project", "Status");
        });

        handle.assert_finished();
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().with_fields(expect::msg("scheduler started")))
            .event(expect::event().with_fields(expect::msg("scheduler stopped")))
            .only()
            .run_with_handle();

        tracing::subscriber::with_default(subscriber, || {
            info!("scheduler started");
            warn!("scheduler stopped");
        });

        handle.assert_finished();
    }

    #[test]
    fn test_event_inside_span() {
        let (subscriber, handle) = subscriber::mock()
            .new_span(expect::span().named("deliver"))
            .enter(expect::span().named("deliver"))
            .event(expect::event().with_fields(expect::msg("delivering")))
            .exit(expect::span().named("deliver"))
            .drop_span(expect::span().named("deliver"))
            .only()
            .run_with_handle();

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::span!(tracing::Level::INFO, "deliver", kind = "refresh");
            let _guard = span.enter();
            info!("delivering");
        });

        handle.assert_finished();
    }
}
