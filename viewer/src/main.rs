use iced::{
    time,
    widget::{
        button, canvas::Canvas, checkbox, column, image, progress_bar, row, scrollable, slider,
        stack, text, text_input, Column, Container,
    },
    Alignment, Element, Length, Subscription, Task, Theme,
};
use overlay::OverlayCanvas;
use overlaycore::backend_interface::{JobStatus, RawStatusResponse, VideoInfo};
use overlaycore::playback::{PlanOutcome, PlaybackSource, SequencerStep};
use overlaycore::polling::{Job, JobStore, PollDirective, PollerPhase, POLL_INTERVAL};
use session::JobSession;
use std::collections::BTreeMap;
use std::time::Duration;

mod client;
mod overlay;
mod session;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Viewer::boot, Viewer::update, Viewer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Viewer) -> String {
    "Detection Overlay Viewer".into()
}

fn application_subscription(state: &Viewer) -> Subscription<Message> {
    let mut subscriptions = Vec::new();
    // Poll while any job is still non-terminal. Pausing playback must not
    // pause this; partial results keep arriving either way.
    if state.store.jobs().any(|job| job.poller.is_active()) {
        subscriptions.push(time::every(POLL_INTERVAL).map(|_| Message::PollTick));
    }
    // The draw loop only runs while something is actually playing.
    if state.sessions.values().any(|session| session.playing) {
        subscriptions.push(time::every(Duration::from_millis(16)).map(Message::RedrawTick));
    }
    Subscription::batch(subscriptions)
}

fn application_theme(_: &Viewer) -> Theme {
    Theme::Dark
}

struct Viewer {
    store: JobStore,
    sessions: BTreeMap<String, JobSession>,
    form: SubmitForm,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    PollTick,
    StatusFetched(String, Result<RawStatusResponse, String>),
    RedrawTick(iced::time::Instant),
    FormFieldChanged(FormField, String),
    UseHeatmapToggled(bool),
    SubmitJob,
    JobSubmitted(Result<String, String>),
    VideoInfoFetched(String, Result<VideoInfo, String>),
    TogglePlayback(String),
    Seek(String, f32),
    CancelJob(String),
    RemoveJob(String),
    OverrideColor(String, String),
    ControlAcked(Result<(), String>),
}

#[derive(Debug, Clone, Copy)]
enum FormField {
    VideoPath,
    Model,
    Interval,
}

#[derive(Debug, Clone)]
struct SubmitForm {
    video_path: String,
    model: String,
    interval: String,
    use_heatmap: bool,
}

impl Default for SubmitForm {
    fn default() -> Self {
        Self {
            video_path: String::new(),
            model: "yolov11n.pt".into(),
            interval: "5".into(),
            use_heatmap: false,
        }
    }
}

impl Viewer {
    fn boot() -> (Self, Task<Message>) {
        (
            Viewer {
                store: JobStore::new(),
                sessions: BTreeMap::new(),
                form: SubmitForm::default(),
                status: "No jobs yet".into(),
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::PollTick => {
                let ids: Vec<String> = state.store.jobs().map(|job| job.id().to_string()).collect();
                let mut tasks = Vec::new();
                for id in ids {
                    if let Some(job) = state.store.get_mut(&id) {
                        // The in-flight flag, not the timer period, is what
                        // prevents overlapping polls on a slow backend.
                        if job.poller.begin_request() {
                            tasks.push(poll_task(id));
                        }
                    }
                }
                Task::batch(tasks)
            }
            Message::StatusFetched(id, Ok(raw)) => match raw.decode() {
                Ok(status) => {
                    let reached_success = matches!(status, JobStatus::Success { .. });
                    let directive = state.store.apply_status(&id, status);

                    if let (Some(job), Some(session)) =
                        (state.store.get(&id), state.sessions.get_mut(&id))
                    {
                        session.sync_duration(job.results().len(), job.heatmap_analysis.as_ref());
                        let encoded = job.heatmap_frames.clone();
                        session.load_heatmap_frames(&encoded);
                        state.status = phase_line(job);
                    }
                    if directive == Some(PollDirective::Stop) {
                        state.push_history(format!("Job {id} stopped polling"));
                    }
                    if reached_success {
                        let for_result = id.clone();
                        return Task::perform(client::fetch_video_info(id), move |result| {
                            Message::VideoInfoFetched(for_result.clone(), result)
                        });
                    }
                    Task::none()
                }
                Err(err) => {
                    state.store.apply_error(&id, err.to_string());
                    state.status = format!("Job {id}: bad status payload: {err}");
                    Task::none()
                }
            },
            Message::StatusFetched(id, Err(err)) => {
                // Transient network failure: surfaced, counted, and the
                // poll timer keeps running.
                state.store.apply_error(&id, err.clone());
                state.status = format!("Poll error for {id}: {err}");
                Task::none()
            }
            Message::RedrawTick(now) => {
                let ids: Vec<String> = state.sessions.keys().cloned().collect();
                for id in ids {
                    let mut drew = false;
                    let mut skipped = false;
                    if let (Some(session), Some(job)) =
                        (state.sessions.get_mut(&id), state.store.get_mut(&id))
                    {
                        if !session.playing {
                            continue;
                        }
                        session.advance_clock(now);

                        let results = job.results();
                        let display = session.display_size(job.detector_resolution);
                        let scaler = job.scaler_for(display);
                        match session.planner.plan(
                            session.position,
                            session.duration,
                            &results,
                            &scaler,
                            &mut job.palette,
                        ) {
                            PlanOutcome::Draw(plan) => {
                                session.plan = Some(plan);
                                session.cache.clear();
                                drew = true;
                            }
                            PlanOutcome::Skip => skipped = true,
                        }

                        if let SequencerStep::Advance(index) =
                            session.sequencer.tick(session.position, session.duration)
                        {
                            session.current_heatmap = Some(index);
                        }
                    }
                    if drew {
                        state.store.metrics().record_frame_drawn();
                    } else if skipped {
                        state.store.metrics().record_frame_skipped();
                    }
                }
                Task::none()
            }
            Message::FormFieldChanged(field, value) => {
                match field {
                    FormField::VideoPath => state.form.video_path = value,
                    FormField::Model => state.form.model = value,
                    FormField::Interval => state.form.interval = value,
                }
                Task::none()
            }
            Message::UseHeatmapToggled(value) => {
                state.form.use_heatmap = value;
                Task::none()
            }
            Message::SubmitJob => {
                if state.form.video_path.trim().is_empty() {
                    state.status = "Enter a video path first".into();
                    return Task::none();
                }
                let interval = state.form.interval.parse::<u32>().unwrap_or(1).max(1);
                state.status = "Uploading...".into();
                Task::perform(
                    client::submit_job(
                        state.form.video_path.clone(),
                        state.form.model.clone(),
                        interval,
                        state.form.use_heatmap,
                    ),
                    Message::JobSubmitted,
                )
            }
            Message::JobSubmitted(Ok(id)) => {
                state.store.insert(&id);
                state
                    .sessions
                    .insert(id.clone(), JobSession::new(id.clone()));
                state.push_history(format!("Job {id} submitted"));
                state.status = format!("Job {id} accepted");
                // First poll goes out immediately; the interval timer
                // takes over afterwards.
                if let Some(job) = state.store.get_mut(&id) {
                    if job.poller.begin_request() {
                        return poll_task(id);
                    }
                }
                Task::none()
            }
            Message::JobSubmitted(Err(err)) => {
                state.status = format!("Submission failed: {err}");
                Task::none()
            }
            Message::VideoInfoFetched(id, Ok(info)) => {
                if let Some(session) = state.sessions.get_mut(&id) {
                    session.ladder =
                        Some(overlaycore::playback::SourceLadder::from_video_info(&info));
                }
                state.push_history(format!("Job {id} stream ready"));
                Task::none()
            }
            Message::VideoInfoFetched(id, Err(err)) => {
                if let Some(ladder) = state
                    .sessions
                    .get_mut(&id)
                    .and_then(|session| session.ladder.as_mut())
                {
                    ladder.on_error();
                }
                state.status = format!("Stream info for {id} failed: {err}");
                Task::none()
            }
            Message::TogglePlayback(id) => {
                let Some(session) = state.sessions.get_mut(&id) else {
                    return Task::none();
                };
                if session.toggle_playback() {
                    Task::perform(client::resume_processing(), Message::ControlAcked)
                } else {
                    // Playback pauses; polling deliberately does not.
                    Task::perform(client::pause_processing(), Message::ControlAcked)
                }
            }
            Message::Seek(id, position) => {
                if let Some(session) = state.sessions.get_mut(&id) {
                    session.seek(f64::from(position));
                }
                Task::none()
            }
            Message::CancelJob(id) => {
                if let Some(job) = state.store.get_mut(&id) {
                    // Advisory only; the poller goes terminal when a later
                    // response actually reports Cancelled.
                    job.poller.note_cancel_requested();
                }
                state.push_history(format!("Cancellation requested for {id}"));
                Task::perform(client::cancel_job(id), Message::ControlAcked)
            }
            Message::RemoveJob(id) => {
                state.sessions.remove(&id);
                state.store.remove(&id);
                state.push_history(format!("Job {id} removed"));
                Task::none()
            }
            Message::OverrideColor(id, label) => {
                let current = state
                    .store
                    .get(&id)
                    .and_then(|job| job.palette.get(&label))
                    .map(|entry| entry.hue)
                    .unwrap_or(0.0);
                state
                    .store
                    .set_color_override(&id, &label, (current + 150.0) % 360.0);
                Task::none()
            }
            Message::ControlAcked(Ok(())) => Task::none(),
            Message::ControlAcked(Err(err)) => {
                state.status = format!("Control request failed: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let metrics = state.store.metrics().snapshot();

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let form_column = column![
            text("Submit Video").size(26),
            text_input("Video path", &state.form.video_path)
                .on_input(|value| Message::FormFieldChanged(FormField::VideoPath, value))
                .padding(6),
            text_input("Model", &state.form.model)
                .on_input(|value| Message::FormFieldChanged(FormField::Model, value))
                .padding(6),
            text_input("Frame interval", &state.form.interval)
                .on_input(|value| Message::FormFieldChanged(FormField::Interval, value))
                .padding(6),
            checkbox(state.form.use_heatmap)
                .label("Generate heatmap overlays")
                .on_toggle(Message::UseHeatmapToggled),
            button("Upload and process")
                .on_press(Message::SubmitJob)
                .padding(10),
            text(&state.status).size(14),
            text(format!(
                "polls {} (errors {}) | draws {} (skipped {})",
                metrics.polls, metrics.poll_errors, metrics.frames_drawn, metrics.frames_skipped
            ))
            .size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(140.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let mut jobs_column = Column::new()
            .spacing(16)
            .padding(16)
            .push(text("Jobs").size(26));
        if state.store.is_empty() {
            jobs_column = jobs_column.push(text("Submit a video to start a job").size(14));
        }
        for job in state.store.jobs() {
            if let Some(session) = state.sessions.get(job.id()) {
                jobs_column = jobs_column.push(job_panel(job, session));
            }
        }

        let layout = row![
            form_column,
            Container::new(scrollable(jobs_column)).width(Length::Fill)
        ]
        .spacing(20)
        .align_y(Alignment::Start)
        .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn poll_task(id: String) -> Task<Message> {
    let for_result = id.clone();
    Task::perform(client::fetch_status(id), move |result| {
        Message::StatusFetched(for_result.clone(), result)
    })
}

fn phase_line(job: &Job) -> String {
    match job.poller.phase() {
        PollerPhase::Pending => format!("Job {}: pending", job.id()),
        PollerPhase::Running { percent, message } => {
            format!("Job {}: {percent}% - {message}", job.id())
        }
        PollerPhase::Succeeded => format!("Job {}: finished", job.id()),
        PollerPhase::Failed { message } => format!("Job {}: failed: {message}", job.id()),
        PollerPhase::Cancelled => format!("Job {}: cancelled", job.id()),
    }
}

fn job_panel<'a>(job: &'a Job, session: &'a JobSession) -> Element<'a, Message> {
    let id = job.id().to_string();
    let percent = match job.poller.phase() {
        PollerPhase::Running { percent, .. } => *percent,
        PollerPhase::Succeeded => 100,
        _ => 0,
    };

    let mut header = column![
        text(phase_line(job)).size(16),
        progress_bar(0.0..=100.0, f32::from(percent)).girth(Length::Fixed(8.0)),
    ]
    .spacing(4);

    if let Some(remaining) = job.poller.estimated_remaining(session.started.elapsed()) {
        header = header.push(text(format!("about {}s remaining", remaining.as_secs())).size(12));
    }
    if let Some(error) = job.poller.last_error() {
        header = header.push(text(format!("last poll error: {error}")).size(12));
    }

    let display = session.display_size(job.detector_resolution);
    let canvas_widget = Canvas::new(OverlayCanvas {
        cache: &session.cache,
        plan: session.plan.as_ref(),
        has_backdrop: session.current_heatmap_handle().is_some(),
    })
    .width(Length::Fixed(display.width))
    .height(Length::Fixed(display.height));

    let overlay_area: Element<'a, Message> = match session.current_heatmap_handle() {
        Some(handle) => stack![
            image(handle.clone())
                .width(Length::Fixed(display.width))
                .height(Length::Fixed(display.height)),
            canvas_widget
        ]
        .into(),
        None => canvas_widget.into(),
    };

    let toggle_id = id.clone();
    let seek_id = id.clone();
    let controls = row![
        button(text(if session.playing { "Pause" } else { "Play" }).size(14))
            .on_press(Message::TogglePlayback(toggle_id))
            .padding(6),
        slider(
            0.0..=session.duration.max(0.001) as f32,
            session.position as f32,
            move |value| Message::Seek(seek_id.clone(), value)
        )
        .width(Length::Fill),
        text(format!("{:.1}/{:.1}s", session.position, session.duration)).size(12),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let mut palette_rows = Column::new().spacing(2);
    if job.palette.is_empty() {
        palette_rows = palette_rows.push(text("No classes observed yet").size(12));
    }
    for (label, entry) in job.palette.iter() {
        let override_id = id.clone();
        let override_label = label.clone();
        palette_rows = palette_rows.push(
            row![
                text(format!("{label} {}", entry.hex)).size(12),
                button(text("recolor").size(10))
                    .on_press(Message::OverrideColor(override_id, override_label))
                    .padding(2),
            ]
            .spacing(6)
            .align_y(Alignment::Center),
        );
    }

    let frequency_line = if job.object_frequency.is_empty() {
        "No frequency data yet".to_string()
    } else {
        job.object_frequency
            .iter()
            .map(|(class, count)| format!("{class}: {count}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut details = column![
        text(format!("Objects: {frequency_line}")).size(12),
        text(source_line(session)).size(12),
    ]
    .spacing(4);

    if let Some(analysis) = &job.heatmap_analysis {
        details = details.push(
            text(format!(
                "Heatmap: peak at {:.1}s, avg intensity {:.0}%, movement {:.1}s of {:.1}s",
                analysis.peak_movement_time,
                analysis.average_intensity,
                analysis.movement_duration,
                analysis.total_duration
            ))
            .size(12),
        );
    }

    let cancel_id = id.clone();
    let remove_id = id.clone();
    let mut actions = row![].spacing(8);
    if !job.poller.is_terminal() {
        actions = actions.push(
            button(text("Cancel").size(14))
                .on_press(Message::CancelJob(cancel_id))
                .padding(6),
        );
    }
    actions = actions.push(
        button(text("Remove").size(14))
            .on_press(Message::RemoveJob(remove_id))
            .padding(6),
    );

    Container::new(
        column![header, overlay_area, controls, palette_rows, details, actions].spacing(10),
    )
    .padding(10)
    .into()
}

fn source_line(session: &JobSession) -> String {
    match &session.ladder {
        Some(ladder) => match ladder.current() {
            PlaybackSource::Adaptive(url) => format!("Source: adaptive stream {url}"),
            PlaybackSource::Progressive(url) => format!("Source: progressive stream {url}"),
            PlaybackSource::DownloadOnly(url) => {
                format!("Playback unavailable; download at {url}")
            }
        },
        None => "Source: not ready".into(),
    }
}
