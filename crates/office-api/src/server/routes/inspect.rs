#[derive(Debug, Serialize)]
struct AgentsResponse {
    schema_version: String,
    run_id: String,
    agents: Vec<contracts::AgentDetail>,
}

async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, HttpApiError> {
    let status = {
        let inner = state.inner.lock().await;
        require_sim(&inner)?.status().clone()
    };
    Ok(Json(StatusResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        status,
    }))
}

async fn get_agents(State(state): State<AppState>) -> Result<Json<AgentsResponse>, HttpApiError> {
    let (run_id, agents) = {
        let inner = state.inner.lock().await;
        let engine = require_sim(&inner)?;
        (engine.run_id().to_string(), engine.agent_details())
    };
    Ok(Json(AgentsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        run_id,
        agents,
    }))
}

async fn get_agent(
    Path(agent_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<contracts::AgentDetail>, HttpApiError> {
    let detail = {
        let inner = state.inner.lock().await;
        require_sim(&inner)?.agent_detail(&agent_id)
    };
    detail
        .map(Json)
        .ok_or_else(|| HttpApiError::agent_not_found(&agent_id))
}

async fn get_frame(
    State(state): State<AppState>,
) -> Result<Json<contracts::RenderFrame>, HttpApiError> {
    let frame = {
        let inner = state.inner.lock().await;
        require_sim(&inner)?.render_frame()
    };
    Ok(Json(frame))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    after: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EventsResponse {
    schema_version: String,
    run_id: String,
    total: usize,
    next_cursor: Option<usize>,
    events: Vec<contracts::Event>,
}

async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, HttpApiError> {
    let after = query.after.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let (run_id, total, next_cursor, page) = {
        let inner = state.inner.lock().await;
        let engine = require_sim(&inner)?;
        let total = engine.events().len();
        let (start, end, next_cursor) = paginate(total, Some(after), Some(limit))
            .map_err(|message| HttpApiError::invalid_query(message, None))?;
        let page = engine.events()[start..end].to_vec();
        (engine.run_id().to_string(), total, next_cursor, page)
    };

    Ok(Json(EventsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        run_id,
        total,
        next_cursor,
        events: page,
    }))
}
