mod attachment;
mod attempt;
mod conversation;
mod history;
mod ids;
mod quiz;
mod subject;

pub use attachment::{
    FileUpload, ImageAttachment, MAX_DOCUMENT_BYTES, MAX_IMAGE_BYTES, PDF_MIME, PdfAttachment,
};
pub use attempt::{AttemptSubmission, QuizAttempt, ScoreReport};
pub use conversation::{Checkpoint, Conversation, ConversationTurn, Role};
pub use history::{
    AttemptSummary, Credentials, DoubtHistoryPage, DoubtRecord, PageRequest, ProfileSummary,
    QuizHistoryItem, QuizHistoryPage, RegistrationProfile,
};
pub use ids::{AttemptId, DoubtId, ParseIdError, QuestionId, QuizId, SectionId};
pub use quiz::{AnswerKey, AnswerRecord, OptionKey, QuestionDraft, Quiz, QuizQuestion, QuizSection};
pub use subject::{PRESET_SUBJECTS, SubjectSet};
