use frontdesk_core::knowledge::KnowledgeBase;

use crate::conversation::Message;

/// Seeds each conversation with the two leading system messages: the
/// persona instruction first, then the static business knowledge labeled
/// as trusted context. The ordering is fixed. Stateless between turns;
/// the caller supplies prior history.
#[derive(Clone, Debug)]
pub struct ContextAssembler {
    business_name: String,
    knowledge: KnowledgeBase,
}

impl ContextAssembler {
    pub fn new(business_name: impl Into<String>, knowledge: KnowledgeBase) -> Self {
        Self { business_name: business_name.into(), knowledge }
    }

    pub fn initial_messages(&self) -> Vec<Message> {
        vec![Message::system(self.persona()), Message::system(self.trusted_context())]
    }

    fn persona(&self) -> String {
        format!(
            "You are {name}'s virtual concierge. Stay in character as a helpful, \
             knowledgeable assistant for the business. Use the provided business summary \
             and document to answer questions accurately. If you cannot confidently \
             answer, call the record_feedback tool with the user's question. Encourage \
             potential customers to share their name and email, and call \
             record_customer_interest when they do.",
            name = self.business_name
        )
    }

    fn trusted_context(&self) -> String {
        format!(
            "Business summary (trusted context):\n{summary}\n\nBusiness document (trusted context):\n{document}",
            summary = self.knowledge.summary,
            document = self.knowledge.document,
        )
    }
}

#[cfg(test)]
mod tests {
    use frontdesk_core::knowledge::KnowledgeBase;

    use super::ContextAssembler;
    use crate::conversation::Role;

    #[test]
    fn persona_comes_before_trusted_context() {
        let knowledge = KnowledgeBase {
            summary: "We plan eco-friendly trips.".to_string(),
            document: "Founded in 2019.".to_string(),
        };
        let assembler = ContextAssembler::new("EcoVoyage Travel", knowledge);

        let messages = assembler.initial_messages();

        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|message| message.role == Role::System));
        assert!(messages[0].content.contains("EcoVoyage Travel"));
        assert!(messages[0].content.contains("record_feedback"));
        assert!(messages[1].content.contains("trusted context"));
        assert!(messages[1].content.contains("We plan eco-friendly trips."));
        assert!(messages[1].content.contains("Founded in 2019."));
    }

    #[test]
    fn assembly_is_stateless_across_calls() {
        let assembler = ContextAssembler::new("Acme", KnowledgeBase::default());

        assert_eq!(assembler.initial_messages(), assembler.initial_messages());
    }
}
