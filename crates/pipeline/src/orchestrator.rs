//! Pipeline orchestrator — research, validation, memory write-back,
//! writing and citation, strictly in that order.

use chrono::Utc;
use citewright_core::event::{EventBus, PipelineEvent, Stage};
use citewright_core::tool::{KnowledgeLookup, WebSearch};
use citewright_memory::FactMemory;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::citation::{self, CitationOutput, CitationPolicy};
use crate::model::StageModels;
use crate::research::{self, ResearchOutput};
use crate::validation::{self, ValidationOutput};
use crate::writer::{self, WriterOutput};

/// Everything a run talks to, built once and shared across runs.
pub struct PipelineContext {
    pub models: StageModels,
    pub search: Arc<dyn WebSearch>,
    pub lookup: Arc<dyn KnowledgeLookup>,
    pub memory: Arc<FactMemory>,
    pub citation: CitationPolicy,
    pub events: Arc<EventBus>,
}

/// Final text plus every intermediate artifact of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub topic: String,
    pub research: ResearchOutput,
    pub validation: ValidationOutput,
    pub draft: WriterOutput,
    pub citation: CitationOutput,
    pub final_text: String,
    /// Validated facts that reached the memory store
    pub stored_facts: usize,
}

pub struct Pipeline {
    ctx: PipelineContext,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.ctx.events.clone()
    }

    fn started(&self, stage: Stage) -> Instant {
        self.ctx.events.publish(PipelineEvent::StageStarted {
            stage,
            model: self.ctx.models.get(stage).model().to_string(),
            timestamp: Utc::now(),
        });
        Instant::now()
    }

    fn completed(&self, stage: Stage, start: Instant, items: usize, rejected_lines: usize) {
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(%stage, items, rejected_lines, duration_ms, "Stage complete");
        self.ctx.events.publish(PipelineEvent::StageCompleted {
            stage,
            items,
            rejected_lines,
            duration_ms,
            timestamp: Utc::now(),
        });
    }

    /// Run all four stages for `topic`.
    pub async fn run(&self, topic: &str) -> citewright_core::Result<PipelineRun> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(citewright_core::Error::InvalidInput("topic must not be blank".into()));
        }

        info!(topic, "Pipeline run started");
        self.ctx.events.publish(PipelineEvent::RunStarted {
            topic: topic.to_string(),
            timestamp: Utc::now(),
        });
        let models = &self.ctx.models;

        let t = self.started(Stage::Research);
        let research = research::research(topic, self.ctx.search.as_ref(), &models.research).await?;
        self.completed(Stage::Research, t, research.facts.len(), research.report.rejected_count());

        let t = self.started(Stage::Validation);
        let validation = validation::validate(
            topic,
            &research,
            &self.ctx.memory,
            self.ctx.lookup.as_ref(),
            &models.validation,
        )
        .await?;
        self.completed(Stage::Validation, t, validation.facts.len(), validation.report.rejected_count());

        let mut stored_facts = 0;
        for fact in &validation.facts {
            if self.ctx.memory.store_validated(fact).await {
                stored_facts += 1;
            }
        }
        info!(stored = stored_facts, of = validation.facts.len(), "Validated facts written to memory");
        self.ctx.events.publish(PipelineEvent::FactsStored {
            count: stored_facts,
            timestamp: Utc::now(),
        });

        let t = self.started(Stage::Writer);
        let draft = writer::write(topic, &validation.facts, &models.writer).await?;
        self.completed(Stage::Writer, t, draft.facts_used.len(), 0);

        let t = self.started(Stage::Citation);
        let citation = citation::cite(&draft.article, &models.citation, &self.ctx.citation).await?;
        self.completed(Stage::Citation, t, citation.references.len(), citation.report.rejected_count());

        let final_text = citation.text.clone();
        self.ctx.events.publish(PipelineEvent::RunFinished {
            topic: topic.to_string(),
            article_chars: final_text.chars().count(),
            timestamp: Utc::now(),
        });

        Ok(PipelineRun {
            topic: topic.to_string(),
            research,
            validation,
            draft,
            citation,
            final_text,
            stored_facts,
        })
    }
}
