#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateSimRequest {
    Config(RunConfig),
    WithOptions(CreateSimOptions),
}

#[derive(Debug, Deserialize)]
struct CreateSimOptions {
    config: RunConfig,
    auto_start: Option<bool>,
}

#[derive(Debug, Serialize)]
struct CreateSimResponse {
    schema_version: String,
    run_id: String,
    status: RunStatus,
    replaced_existing_sim: bool,
    started: bool,
}

async fn create_sim(
    State(state): State<AppState>,
    Json(request): Json<CreateSimRequest>,
) -> Result<Json<CreateSimResponse>, HttpApiError> {
    let (config, auto_start) = match request {
        CreateSimRequest::Config(config) => (config, false),
        CreateSimRequest::WithOptions(options) => {
            (options.config, options.auto_start.unwrap_or(false))
        }
    };

    let mut engine = EngineApi::from_config(config)
        .map_err(|err| HttpApiError::internal("simulation build failed", Some(err.to_string())))?;
    if auto_start {
        engine.start();
    }

    let response = {
        let mut inner = state.inner.lock().await;
        let replaced_existing_sim = inner.engine.is_some();
        let status = engine.status().clone();
        let run_id = engine.run_id().to_string();
        inner.engine = Some(engine);
        inner.emitted_event_count = 0;
        CreateSimResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id,
            status,
            replaced_existing_sim,
            started: auto_start,
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    schema_version: String,
    status: RunStatus,
}

async fn start_sim(State(state): State<AppState>) -> Result<Json<StatusResponse>, HttpApiError> {
    let status = {
        let mut inner = state.inner.lock().await;
        require_sim_mut(&mut inner)?.start()
    };
    Ok(Json(StatusResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        status,
    }))
}

async fn pause_sim(State(state): State<AppState>) -> Result<Json<StatusResponse>, HttpApiError> {
    let status = {
        let mut inner = state.inner.lock().await;
        require_sim_mut(&mut inner)?.pause()
    };
    Ok(Json(StatusResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        status,
    }))
}

#[derive(Debug, Deserialize)]
struct StepRequest {
    steps: Option<u64>,
}

#[derive(Debug, Serialize)]
struct StepResponse {
    schema_version: String,
    status: RunStatus,
    committed_ticks: u64,
}

async fn step_sim(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> Result<Json<StepResponse>, HttpApiError> {
    let steps = request.steps.unwrap_or(1);
    if steps == 0 {
        return Err(HttpApiError::invalid_query(
            "steps must be at least 1",
            None,
        ));
    }

    let (status, committed, messages) = {
        let mut inner = state.inner.lock().await;
        let engine = require_sim_mut(&mut inner)?;
        let (status, committed) = engine.step(steps);
        let messages = collect_delta_messages(&mut inner);
        (status, committed, messages)
    };
    broadcast_all(&state, messages);

    Ok(Json(StepResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        status,
        committed_ticks: committed,
    }))
}

#[derive(Debug, Serialize)]
struct SubmitCommandResponse {
    schema_version: String,
    result: CommandResult,
}

async fn submit_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<SubmitCommandResponse>, HttpApiError> {
    let result = {
        let mut inner = state.inner.lock().await;
        require_sim_mut(&mut inner)?.submit_command(command)
    };
    if !result.accepted {
        return Err(HttpApiError::invalid_command(
            "command rejected",
            result.reason,
        ));
    }
    Ok(Json(SubmitCommandResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        result,
    }))
}
