//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::data;
use crate::error::MpgError;
use crate::inference::predict_record;
use crate::training::train_bundle;

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Training
// ============================================================================

/// Upload a CSV and train a fresh bundle. A successful run fully replaces any
/// previously persisted bundle; a failed run leaves it untouched.
pub async fn train(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        info!("Received training file: {} ({} bytes)", file_name, bytes.len());

        let df = data::read_csv_bytes(&bytes)?;
        let bundle = train_bundle(&df, &state.training)?;
        state.store.replace(&bundle)?;

        return Ok(Json(json!({
            "message": "Model trained successfully",
            "metrics": { "r2": bundle.metrics.r2, "mae": bundle.metrics.mae },
        })));
    }

    Err(ServerError::BadRequest("Please upload a CSV file".to_string()))
}

// ============================================================================
// Prediction
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let record: &Map<String, Value> = payload
        .as_object()
        .ok_or_else(|| ServerError::BadRequest("Expected a JSON object".to_string()))?;

    let bundle = state.store.load()?.ok_or(MpgError::ModelNotTrained)?;

    let prediction = predict_record(&bundle, record, state.unknown_policy)?;

    state.history.append(record, &bundle.features, prediction)?;

    info!(prediction, "Prediction served");

    Ok(Json(json!({ "prediction": prediction })))
}

// ============================================================================
// Read-only endpoints
// ============================================================================

/// Known category values per categorical feature, for populating the form's
/// selection controls.
pub async fn get_options(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let bundle = state.store.load()?.ok_or(MpgError::ModelNotTrained)?;

    let mut options = Map::new();
    for (feature, classes) in bundle.category_options() {
        options.insert(feature.to_string(), json!(classes));
    }

    Ok(Json(Value::Object(options)))
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let body = match state.store.load()? {
        Some(bundle) => json!({ "r2": bundle.metrics.r2, "mae": bundle.metrics.mae }),
        None => json!({ "r2": null, "mae": null }),
    };
    Ok(Json(body))
}

pub async fn get_feature_importance(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let bundle = state.store.load()?.ok_or(MpgError::ModelNotTrained)?;

    let importances: Vec<f64> = bundle
        .forest
        .feature_importances()
        .map(|imp| imp.to_vec())
        .ok_or_else(|| ServerError::Internal("model has no importances".to_string()))?;

    Ok(Json(json!({
        "features": bundle.features,
        "importances": importances,
    })))
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let entries = state.history.read_all()?;
    let rows: Vec<Value> = entries.into_iter().map(Value::Object).collect();
    Ok(Json(Value::Array(rows)))
}

/// The raw history CSV as a download.
pub async fn download_history(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    if !state.history.exists() {
        return Err(ServerError::NotFound("No history found".to_string()));
    }

    let bytes = tokio::fs::read(state.history.path()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prediction_history.csv\"",
            ),
        ],
        bytes,
    ))
}

// ============================================================================
// UI
// ============================================================================

pub async fn serve_index() -> Html<&'static str> {
    // Embedded HTML for portability
    Html(EMBEDDED_INDEX_HTML)
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Car MPG Predictor</title>
  <style>
    body {font-family:'Segoe UI',sans-serif;background:#f7f7f7;color:#222;margin:0;padding:40px;}
    .container {max-width:900px;margin:auto;background:#fff;padding:30px 40px;
                border-radius:12px;box-shadow:0 2px 10px rgba(0,0,0,0.15);}
    h2 {text-align:center;margin-bottom:30px;}
    select,input,button {margin:8px 0;padding:8px;width:230px;border:1px solid #ccc;border-radius:6px;}
    button {background:#333;color:#fff;cursor:pointer;font-weight:bold;border:none;}
    button:hover {background:#4CAF50;}
    .metric-box {background:#fff;padding:10px;margin:15px 0;border-radius:8px;border:1px solid #ccc;width:320px;}
    table {width:100%;border-collapse:collapse;margin-top:15px;}
    th,td {border:1px solid #ccc;padding:10px;text-align:center;}
    th {background:#333;color:#fff;}
    tr:nth-child(even) {background:#f0f0f0;}
    .section {margin-top:40px;}
    #resultCard {margin-top:15px;background:#4CAF50;color:white;padding:15px;
                 border-radius:10px;font-size:1.3rem;font-weight:bold;display:none;text-align:center;}
    .bar {background:#4CAF50;height:18px;border-radius:4px;}
    .bar-row {display:flex;align-items:center;gap:10px;margin:4px 0;}
    .bar-label {width:140px;text-align:right;font-size:0.9rem;}
  </style>
</head>
<body>
<div class="container">
  <h2>Car MPG Predictor</h2>

  <div class="section">
    <h3>Train Model</h3>
    <input type="file" id="fileInput" accept=".csv">
    <button onclick="uploadFile()">Train Model</button>
    <p id="trainStatus"></p>
    <div class="metric-box">
      <strong>Model Performance:</strong>
      <p id="accuracyMetrics">No model trained yet.</p>
    </div>
  </div>

  <div class="section">
    <h3>Predict MPG</h3>
    <p id="modelStatus"></p>
    <form id="predictForm">
      <label>Cylinders:</label><br><select id="cylinders"></select><br>
      <label>Displacement:</label><br><select id="displacement"></select><br>
      <label>Year:</label><br><select id="year"></select><br>
      <label>Make:</label><br><select id="make"></select><br>
      <label>Fuel Type:</label><br><select id="fuel_type"></select><br>
      <label>Transmission:</label><br><select id="transmission"></select><br>
      <button type="button" onclick="predict()">Predict MPG</button>
    </form>
    <div id="resultCard"></div>
  </div>

  <div class="section">
    <h3>Feature Importance</h3>
    <div id="importanceChart"></div>
  </div>

  <div class="section">
    <h3>Prediction History</h3>
    <button onclick="loadHistory()">Refresh History</button>
    <button onclick="window.location.href='/download_history'">Download as CSV</button>
    <div id="historyTable"></div>
  </div>
</div>

<script>
const DEFAULT_MAKES=["Toyota","Honda","Ford","Chevrolet","Nissan","Other"];
const DEFAULT_FUELS=["gasoline","diesel","hybrid","electric","other"];
const DEFAULT_TRANS=["automatic","manual","cvt","other"];

window.onload=()=>{
  fillSelect("cylinders",1,16);
  fillSelect("displacement",1,10);
  fillSelect("year",1980,2025);
  loadOptions();loadMetrics();loadHistory();loadImportance();
};

function fillSelect(id,start,end){
  const el=document.getElementById(id);el.innerHTML="";
  for(let i=start;i<=end;i++){const o=document.createElement("option");o.value=i;o.text=i;el.appendChild(o);}
}

function populateCategorical(makes,fuels,trans){
  [["make",makes],["fuel_type",fuels],["transmission",trans]].forEach(([id,vals])=>{
    const el=document.getElementById(id);el.innerHTML="";
    vals.forEach(v=>{const o=document.createElement("option");o.value=v;o.text=v;el.appendChild(o);});
  });
}

async function loadOptions(){
  try{
    const res=await fetch("/options");const data=await res.json();
    if(data.error){
      populateCategorical(DEFAULT_MAKES,DEFAULT_FUELS,DEFAULT_TRANS);
      document.getElementById("modelStatus").innerText="Model not trained yet - using default lists.";
    }else{
      populateCategorical(data.make||DEFAULT_MAKES,data.fuel_type||DEFAULT_FUELS,data.transmission||DEFAULT_TRANS);
      document.getElementById("modelStatus").innerText="Model options loaded.";
    }
  }catch(e){
    populateCategorical(DEFAULT_MAKES,DEFAULT_FUELS,DEFAULT_TRANS);
  }
}

async function uploadFile(){
  const f=document.getElementById("fileInput");
  if(!f.files.length){alert("Please select a CSV file.");return;}
  const form=new FormData();form.append("file",f.files[0]);
  const res=await (await fetch("/train",{method:"POST",body:form})).json();
  document.getElementById("trainStatus").innerText=res.message||res.error;
  await loadOptions();await loadMetrics();await loadImportance();
}

async function loadMetrics(){
  const d=await (await fetch("/metrics")).json();
  const el=document.getElementById("accuracyMetrics");
  if(!d||d.r2===null)el.innerHTML="No model trained yet.";
  else el.innerHTML=`R&sup2; Score: <b>${d.r2}</b><br>MAE: <b>${d.mae}</b>`;
}

async function predict(){
  const card=document.getElementById("resultCard");
  card.style.display="block";card.innerText="Predicting...";
  const p={
    cylinders:+document.getElementById("cylinders").value,
    displacement:+document.getElementById("displacement").value,
    year:+document.getElementById("year").value,
    make:document.getElementById("make").value,
    fuel_type:document.getElementById("fuel_type").value,
    transmission:document.getElementById("transmission").value
  };
  const r=await (await fetch("/predict",{method:"POST",headers:{"Content-Type":"application/json"},body:JSON.stringify(p)})).json();
  card.innerText=r.prediction!==undefined?`Predicted MPG: ${r.prediction}`:r.error;
  loadHistory();
}

async function loadImportance(){
  const d=await (await fetch("/feature_importance")).json();
  const div=document.getElementById("importanceChart");
  if(d.error){div.innerHTML="";return;}
  const max=Math.max(...d.importances,1e-9);
  div.innerHTML=d.features.map((f,i)=>
    `<div class="bar-row"><span class="bar-label">${f}</span>`+
    `<div class="bar" style="width:${Math.round(400*d.importances[i]/max)}px"></div>`+
    `<span>${d.importances[i].toFixed(3)}</span></div>`).join("");
}

async function loadHistory(){
  const d=await (await fetch("/history")).json();
  const div=document.getElementById("historyTable");
  if(!d.length){div.innerHTML="<p>No prediction history yet.</p>";return;}
  let t="<table><tr>"+Object.keys(d[0]).map(k=>`<th>${k}</th>`).join("")+"</tr>";
  d.forEach(r=>t+="<tr>"+Object.values(r).map(v=>`<td>${v}</td>`).join("")+"</tr>");
  div.innerHTML=t+"</table>";
}
</script>
</body>
</html>"#;
